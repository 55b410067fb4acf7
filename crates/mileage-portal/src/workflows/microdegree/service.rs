use std::collections::HashSet;
use std::sync::Arc;

use chrono::Utc;
use tracing::{error, info, warn};
use uuid::Uuid;

use super::catalog::{self, Catalog, CATALOG_FILE_NAME};
use super::domain::{
    CategoryList, MdApplication, MdProcess, ProcessList, Subject, SubjectCategory, SubjectList,
};
use super::evaluation::{evaluate_all, ProcessReport};
use crate::error::{ApiError, StoreContext, MISSING_FIELDS};
use crate::storage::{DocumentPath, DocumentStore, DocumentStoreExt};
use crate::workflows::decode_upload;
use crate::workflows::spreadsheet::{SpreadsheetError, SpreadsheetFile};
use crate::workflows::students::StudentDirectory;
use crate::workflows::term::Term;

const PROCESSES: &str = "md-process";
const CATEGORIES: &str = "md-category";
const SUBJECTS: &str = "md-subject";
const COMPLETED_SUBJECTS: &str = "md-completed-subjects";
const APPLICATIONS: &str = "md-applications";

pub const NO_COMPLETED_PROCESS: &str = "이수한 MD 과정이 없습니다.";

/// Microdegree catalog, completed-subject tracking and MD application intake for one store.
pub struct MicrodegreeService<D> {
    store: Arc<D>,
    students: StudentDirectory<D>,
}

impl<D> MicrodegreeService<D>
where
    D: DocumentStore + 'static,
{
    pub fn new(store: Arc<D>) -> Self {
        let students = StudentDirectory::new(store.clone());
        Self { store, students }
    }

    fn process_list(&self, term: &Term) -> Result<Option<ProcessList>, ApiError> {
        self.store
            .fetch(&term.document(PROCESSES))
            .context("과정 정보를 가져오는 중 오류가 발생했습니다")
    }

    fn existing_process_list(&self, term: &Term) -> Result<ProcessList, ApiError> {
        self.process_list(term)?
            .ok_or_else(|| ApiError::not_found("과정 정보를 찾을 수 없습니다"))
    }

    /// Processes of a term; a term that never had one saved is reported as not found.
    pub fn processes(&self, term: &Term) -> Result<Vec<MdProcess>, ApiError> {
        Ok(self.existing_process_list(term)?.processes)
    }

    pub fn add_process(&self, term: &Term, mut process: MdProcess) -> Result<MdProcess, ApiError> {
        if process.name.trim().is_empty() {
            return Err(ApiError::validation(MISSING_FIELDS));
        }
        if process.id.trim().is_empty() {
            process.id = Uuid::new_v4().to_string();
        }

        let mut list = self.process_list(term)?.unwrap_or_default();
        if list.processes.iter().any(|existing| existing.id == process.id) {
            return Err(ApiError::validation("이미 존재하는 과정입니다"));
        }
        list.processes.push(process.clone());
        self.store
            .put(&term.document(PROCESSES), &list)
            .context("과정 추가 중 오류가 발생했습니다")?;

        info!(process_id = %process.id, university = %term.university_code, "md process added");
        Ok(process)
    }

    pub fn update_process(
        &self,
        term: &Term,
        process_id: &str,
        mut process: MdProcess,
    ) -> Result<MdProcess, ApiError> {
        if process.name.trim().is_empty() {
            return Err(ApiError::validation(MISSING_FIELDS));
        }
        process.id = process_id.to_string();

        let mut list = self.existing_process_list(term)?;
        let slot = list
            .processes
            .iter_mut()
            .find(|existing| existing.id == process_id)
            .ok_or_else(|| ApiError::not_found("과정 정보를 찾을 수 없습니다"))?;
        *slot = process.clone();

        self.store
            .put(&term.document(PROCESSES), &list)
            .context("과정 수정 중 오류가 발생했습니다")?;
        Ok(process)
    }

    pub fn delete_process(&self, term: &Term, process_id: &str) -> Result<(), ApiError> {
        let mut list = self.existing_process_list(term)?;
        let before = list.processes.len();
        list.processes.retain(|process| process.id != process_id);
        if list.processes.len() == before {
            return Err(ApiError::not_found("과정 정보를 찾을 수 없습니다"));
        }

        self.store
            .put(&term.document(PROCESSES), &list)
            .context("과정 삭제 중 오류가 발생했습니다")?;
        info!(process_id, university = %term.university_code, "md process deleted");
        Ok(())
    }

    pub fn categories(&self, term: &Term) -> Result<Vec<SubjectCategory>, ApiError> {
        Ok(self
            .store
            .fetch::<CategoryList>(&term.document(CATEGORIES))
            .context("과목 분류를 가져오는 중 오류가 발생했습니다")?
            .unwrap_or_default()
            .categories)
    }

    /// Replaces the term's categories; blank ids are assigned.
    pub fn put_categories(
        &self,
        term: &Term,
        mut categories: Vec<SubjectCategory>,
    ) -> Result<Vec<SubjectCategory>, ApiError> {
        for category in &mut categories {
            if category.name.trim().is_empty() {
                return Err(ApiError::validation("필드가 부족하거나 잘못된 형식입니다"));
            }
            if category.id.trim().is_empty() {
                category.id = Uuid::new_v4().to_string();
            }
        }

        let list = CategoryList { categories };
        self.store
            .put(&term.document(CATEGORIES), &list)
            .context("과목 분류 저장 중 오류가 발생했습니다")?;
        Ok(list.categories)
    }

    pub fn subjects(&self, term: &Term) -> Result<Vec<Subject>, ApiError> {
        Ok(self
            .store
            .fetch::<SubjectList>(&term.document(SUBJECTS))
            .context("과목 정보를 가져오는 중 오류가 발생했습니다")?
            .unwrap_or_default()
            .subjects)
    }

    /// Replaces the term's subjects; every subject must belong to an existing process.
    pub fn put_subjects(
        &self,
        term: &Term,
        mut subjects: Vec<Subject>,
    ) -> Result<Vec<Subject>, ApiError> {
        let processes = self.process_list(term)?.unwrap_or_default().processes;
        ensure_processes_exist(&processes, &subjects)?;
        for subject in &mut subjects {
            if subject.code.trim().is_empty() {
                return Err(ApiError::validation("필드가 부족하거나 잘못된 형식입니다"));
            }
            if subject.id.trim().is_empty() {
                subject.id = Uuid::new_v4().to_string();
            }
        }

        let list = SubjectList { subjects };
        self.store
            .put(&term.document(SUBJECTS), &list)
            .context("과목 저장 중 오류가 발생했습니다")?;
        Ok(list.subjects)
    }

    /// Replaces categories and subjects from an uploaded workbook; nothing is written on failure.
    pub fn import_catalog(&self, term: &Term, encoded: &str) -> Result<Catalog, ApiError> {
        let bytes = decode_upload(encoded).map_err(|_| SpreadsheetError::Encoding)?;
        let catalog = catalog::read_catalog(bytes).map_err(|err| {
            warn!(error = %err, university = %term.university_code, "md catalog import rejected");
            err
        })?;

        let processes = self.process_list(term)?.unwrap_or_default().processes;
        ensure_processes_exist(&processes, &catalog.subjects)?;

        let categories_path = term.document(CATEGORIES);
        let previous_categories = self
            .store
            .get(&categories_path)
            .context("과목 분류를 가져오는 중 오류가 발생했습니다")?;
        self.store
            .put(
                &categories_path,
                &CategoryList {
                    categories: catalog.categories.clone(),
                },
            )
            .context("과목 분류 저장 중 오류가 발생했습니다")?;
        if let Err(err) = self.store.put(
            &term.document(SUBJECTS),
            &SubjectList {
                subjects: catalog.subjects.clone(),
            },
        ) {
            let restored = match previous_categories {
                Some(previous) => self.store.set(&categories_path, previous),
                None => self.store.delete(&categories_path).map(|_| ()),
            };
            if let Err(restore_err) = restored {
                error!(
                    error = %restore_err,
                    university = %term.university_code,
                    "md categories could not be restored after a failed import"
                );
            }
            return Err(err).context("과목 저장 중 오류가 발생했습니다");
        }

        info!(
            categories = catalog.categories.len(),
            subjects = catalog.subjects.len(),
            university = %term.university_code,
            "md catalog imported"
        );
        Ok(catalog)
    }

    pub fn export_catalog(&self, term: &Term) -> Result<SpreadsheetFile, ApiError> {
        let catalog = Catalog {
            categories: self.categories(term)?,
            subjects: self.subjects(term)?,
        };
        Ok(SpreadsheetFile {
            file_name: CATALOG_FILE_NAME.to_string(),
            bytes: catalog::write_catalog(&catalog)?,
        })
    }

    fn completed_path(term: &Term, user_id: &str) -> DocumentPath {
        term.user_document(COMPLETED_SUBJECTS, user_id)
    }

    pub fn completed_subjects(&self, term: &Term, user_id: &str) -> Result<Vec<Subject>, ApiError> {
        Ok(self
            .store
            .fetch::<SubjectList>(&Self::completed_path(term, user_id))
            .context("과목 정보를 가져오는 중 오류가 발생했습니다")?
            .unwrap_or_default()
            .subjects)
    }

    /// Records a completed subject, tagging it with its category's type when none was sent.
    pub fn add_completed_subject(
        &self,
        term: &Term,
        user_id: &str,
        mut subject: Subject,
    ) -> Result<Vec<Subject>, ApiError> {
        if subject.code.trim().is_empty() || subject.process_id.trim().is_empty() {
            return Err(ApiError::validation(MISSING_FIELDS));
        }
        let processes = self.process_list(term)?.unwrap_or_default().processes;
        ensure_processes_exist(&processes, std::slice::from_ref(&subject))?;
        if subject.id.trim().is_empty() {
            subject.id = Uuid::new_v4().to_string();
        }
        if subject.course_type.is_none() {
            subject.course_type = self
                .categories(term)?
                .into_iter()
                .find(|category| {
                    category.process_id == subject.process_id
                        && category.number == subject.category_number
                })
                .map(|category| category.course_type);
        }

        let path = Self::completed_path(term, user_id);
        let mut list: SubjectList = self
            .store
            .fetch(&path)
            .context("과목 정보를 가져오는 중 오류가 발생했습니다")?
            .unwrap_or_default();
        if !list.subjects.iter().any(|existing| existing.id == subject.id) {
            list.subjects.push(subject);
        }
        self.store
            .put(&path, &list)
            .context("과목 추가 중 오류가 발생했습니다")?;
        Ok(list.subjects)
    }

    pub fn remove_completed_subject(
        &self,
        term: &Term,
        user_id: &str,
        subject_id: &str,
    ) -> Result<Vec<Subject>, ApiError> {
        let path = Self::completed_path(term, user_id);
        let mut list: SubjectList = self
            .store
            .fetch(&path)
            .context("과목 정보를 가져오는 중 오류가 발생했습니다")?
            .ok_or_else(|| ApiError::not_found("해당 사용자의 과목 정보가 없습니다"))?;
        list.subjects.retain(|subject| subject.id != subject_id);
        self.store
            .put(&path, &list)
            .context("과목 삭제 중 오류가 발생했습니다")?;
        Ok(list.subjects)
    }

    /// Completion report for every process of the term.
    pub fn status(&self, term: &Term, user_id: &str) -> Result<Vec<ProcessReport>, ApiError> {
        let processes = self.process_list(term)?.unwrap_or_default().processes;
        let completed = self.completed_subjects(term, user_id)?;
        Ok(evaluate_all(&processes, &completed))
    }

    /// Evaluates the student's subjects and stores the application, replacing any earlier one.
    pub fn submit_application(
        &self,
        term: &Term,
        user_id: &str,
    ) -> Result<MdApplication, ApiError> {
        let processes = self.process_list(term)?.unwrap_or_default().processes;
        let subjects = self.completed_subjects(term, user_id)?;
        let process_names: Vec<String> = evaluate_all(&processes, &subjects)
            .into_iter()
            .filter(|report| report.status.is_process_completed)
            .map(|report| report.process_name)
            .collect();
        if process_names.is_empty() {
            return Err(ApiError::validation(NO_COMPLETED_PROCESS));
        }

        let application = MdApplication {
            id: user_id.to_string(),
            process_names,
            subjects,
            student_info: self.students.student_info(user_id)?,
            submitted_at: Some(Utc::now()),
        };
        self.store
            .put(&term.submissions(APPLICATIONS).child(user_id), &application)
            .context("신청 제출 중 오류가 발생했습니다")?;

        info!(
            user_id,
            processes = application.process_names.len(),
            university = %term.university_code,
            "md application submitted"
        );
        Ok(application)
    }

    pub fn application(&self, term: &Term, user_id: &str) -> Result<MdApplication, ApiError> {
        let mut application: MdApplication = self
            .store
            .fetch(&term.submissions(APPLICATIONS).child(user_id))
            .context("신청 정보를 가져오는 중 오류가 발생했습니다")?
            .ok_or_else(|| ApiError::not_found("신청 정보를 찾을 수 없습니다"))?;
        application.id = user_id.to_string();
        Ok(application)
    }

    pub fn applications(&self, term: &Term) -> Result<Vec<MdApplication>, ApiError> {
        Ok(self
            .store
            .fetch_all::<MdApplication>(&term.submissions(APPLICATIONS))
            .context("신청 목록을 가져오는 중 오류가 발생했습니다")?
            .into_iter()
            .map(|(id, mut application)| {
                application.id = id;
                application
            })
            .collect())
    }
}

fn ensure_processes_exist(processes: &[MdProcess], subjects: &[Subject]) -> Result<(), ApiError> {
    let known: HashSet<&str> = processes.iter().map(|p| p.id.as_str()).collect();
    match subjects
        .iter()
        .find(|subject| !known.contains(subject.process_id.as_str()))
    {
        Some(orphan) => Err(ApiError::validation(format!(
            "존재하지 않는 과정에 속한 과목입니다: {}",
            orphan.code
        ))),
        None => Ok(()),
    }
}
