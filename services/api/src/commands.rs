use crate::infra::read_json_file;
use clap::{Args, ValueEnum};
use mileage_portal::error::AppError;
use mileage_portal::workflows::microdegree::{
    catalog::CATALOG_TEMPLATE_FILE_NAME, catalog_template, evaluate_all, MdProcess, ProcessReport,
    Subject,
};
use mileage_portal::workflows::mileage::workbook::{
    areas_template, courses_template, AREAS_TEMPLATE_FILE_NAME, COURSES_TEMPLATE_FILE_NAME,
};
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum TemplateKind {
    /// Microdegree categories and subjects
    MdCatalog,
    /// Mileage scoring areas
    Areas,
    /// Course catalog
    Courses,
}

impl TemplateKind {
    fn file_name(self) -> &'static str {
        match self {
            TemplateKind::MdCatalog => CATALOG_TEMPLATE_FILE_NAME,
            TemplateKind::Areas => AREAS_TEMPLATE_FILE_NAME,
            TemplateKind::Courses => COURSES_TEMPLATE_FILE_NAME,
        }
    }
}

#[derive(Args, Debug)]
pub(crate) struct TemplateArgs {
    /// Which import template to generate
    #[arg(value_enum)]
    pub(crate) kind: TemplateKind,
    /// Output path (defaults to the template's download name in the current directory)
    #[arg(long)]
    pub(crate) out: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub(crate) struct EvaluateArgs {
    /// JSON file holding an array of microdegree processes
    #[arg(long)]
    pub(crate) processes: PathBuf,
    /// JSON file holding an array of completed subjects
    #[arg(long)]
    pub(crate) subjects: PathBuf,
}

pub(crate) fn run_template(args: TemplateArgs) -> Result<(), AppError> {
    let bytes = match args.kind {
        TemplateKind::MdCatalog => catalog_template()?,
        TemplateKind::Areas => areas_template()?,
        TemplateKind::Courses => courses_template()?,
    };
    let out = args
        .out
        .unwrap_or_else(|| PathBuf::from(args.kind.file_name()));

    std::fs::write(&out, bytes)?;
    println!("Template written to {}", out.display());
    Ok(())
}

pub(crate) fn run_evaluate(args: EvaluateArgs) -> Result<(), AppError> {
    let processes: Vec<MdProcess> = read_json_file(&args.processes)?;
    let subjects: Vec<Subject> = read_json_file(&args.subjects)?;
    let reports = evaluate_all(&processes, &subjects);

    render_reports(&reports);
    println!("{}", serde_json::to_string_pretty(&reports)?);
    Ok(())
}

fn render_reports(reports: &[ProcessReport]) {
    println!("Microdegree evaluation ({} processes)", reports.len());
    for report in reports {
        let status = &report.status;
        println!(
            "- {}: {} | {:.1} credits ({:.1} compulsory, {:.1} optional) | {} standard, {} linked",
            report.process_name,
            if status.is_process_completed {
                "completed"
            } else {
                "in progress"
            },
            status.total_earned_credits,
            status.compulsory_credits_earned,
            status.optional_credits_earned,
            status.standard_courses_completed,
            status.linked_courses_completed
        );
    }
}
