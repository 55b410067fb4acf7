//! Microdegree completion rules.
//!
//! A process is completed when five requirements hold at once: total credits, compulsory
//! credits, optional credits, the compulsory-course rule and the standard/linked course counts.
//! Thresholds of zero are never checked, so an all-zero process is always completed.

use serde::Serialize;

use super::domain::{CourseType, MdProcess, Subject};

/// Progress of one student against one process, with every intermediate count.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessStatus {
    pub is_process_completed: bool,
    pub total_earned_credits: f64,
    pub compulsory_credits_earned: f64,
    pub optional_credits_earned: f64,
    pub standard_courses_completed: usize,
    pub linked_courses_completed: usize,
    pub is_compulsory_credits_requirement_met: bool,
    pub is_optional_credits_requirement_met: bool,
    pub is_compulsory_courses_completion_met: bool,
    pub is_credits_requirement_met: bool,
    pub is_standard_and_linked_courses_requirement_met: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessReport {
    pub process_id: String,
    pub process_name: String,
    #[serde(flatten)]
    pub status: ProcessStatus,
}

/// Evaluates `completed` against `process`; subjects of other processes are ignored.
pub fn evaluate(process: &MdProcess, completed: &[Subject]) -> ProcessStatus {
    let mut compulsory_credits_earned = 0.0;
    let mut optional_credits_earned = 0.0;
    let mut standard_codes: Vec<&str> = Vec::new();
    let mut linked_codes: Vec<&str> = Vec::new();
    let mut is_compulsory_courses_completion_met = !process.requires_compulsory_courses;

    for subject in completed.iter().filter(|s| s.process_id == process.id) {
        if subject.required {
            compulsory_credits_earned += subject.credit;
            is_compulsory_courses_completion_met = true;
        } else {
            optional_credits_earned += subject.credit;
        }

        let bucket = match subject.course_type {
            Some(CourseType::Standard) if process.min_standard_courses > 0 => {
                Some(&mut standard_codes)
            }
            Some(CourseType::Linked) if process.min_linked_courses > 0 => Some(&mut linked_codes),
            _ => None,
        };
        if let Some(codes) = bucket {
            if !codes.contains(&subject.code.as_str()) {
                codes.push(subject.code.as_str());
            }
        }
    }

    let total_earned_credits = compulsory_credits_earned + optional_credits_earned;
    let is_compulsory_credits_requirement_met = process.min_compulsory_credits <= 0.0
        || compulsory_credits_earned >= process.min_compulsory_credits;
    let is_optional_credits_requirement_met = process.min_optional_credits <= 0.0
        || optional_credits_earned >= process.min_optional_credits;
    let is_credits_requirement_met = total_earned_credits >= process.min_required_credits;
    let is_standard_and_linked_courses_requirement_met = standard_codes.len()
        >= process.min_standard_courses as usize
        && linked_codes.len() >= process.min_linked_courses as usize;

    ProcessStatus {
        is_process_completed: is_compulsory_credits_requirement_met
            && is_optional_credits_requirement_met
            && is_compulsory_courses_completion_met
            && is_credits_requirement_met
            && is_standard_and_linked_courses_requirement_met,
        total_earned_credits,
        compulsory_credits_earned,
        optional_credits_earned,
        standard_courses_completed: standard_codes.len(),
        linked_courses_completed: linked_codes.len(),
        is_compulsory_credits_requirement_met,
        is_optional_credits_requirement_met,
        is_compulsory_courses_completion_met,
        is_credits_requirement_met,
        is_standard_and_linked_courses_requirement_met,
    }
}

/// Reports every process of a term in catalog order.
pub fn evaluate_all(processes: &[MdProcess], completed: &[Subject]) -> Vec<ProcessReport> {
    processes
        .iter()
        .map(|process| ProcessReport {
            process_id: process.id.clone(),
            process_name: process.name.clone(),
            status: evaluate(process, completed),
        })
        .collect()
}
