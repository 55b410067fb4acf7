use std::collections::HashSet;
use std::sync::Arc;

use chrono::Utc;
use tracing::{info, warn};

use super::domain::{
    Activity, ActivityDraft, ActivityList, Application, AreaList, Course, CourseList, MileageArea,
    COURSE_COMPLETION_AREA_NAME,
};
use super::schema::build_activity;
use super::workbook;
use crate::error::{ApiError, StoreContext, MISSING_FIELDS};
use crate::storage::{DocumentPath, DocumentStore, DocumentStoreExt};
use crate::workflows::decode_upload;
use crate::workflows::spreadsheet::{SpreadsheetError, SpreadsheetFile};
use crate::workflows::students::StudentDirectory;
use crate::workflows::term::Term;

const AREAS: &str = "mileage";
const COURSES: &str = "courses";
const ACTIVITIES: &str = "activities";
const APPLICATIONS: &str = "applications";

/// Mileage areas, course catalog, student activities and scholarship applications.
pub struct MileageService<D> {
    store: Arc<D>,
    students: StudentDirectory<D>,
}

impl<D> MileageService<D>
where
    D: DocumentStore + 'static,
{
    pub fn new(store: Arc<D>) -> Self {
        let students = StudentDirectory::new(store.clone());
        Self { store, students }
    }

    fn area_list(&self, term: &Term) -> Result<Option<AreaList>, ApiError> {
        self.store
            .fetch(&term.document(AREAS))
            .context("마일리지 정보를 가져오는 중 오류가 발생했습니다")
    }

    pub fn areas(&self, term: &Term) -> Result<Vec<MileageArea>, ApiError> {
        self.area_list(term)?
            .map(|list| list.areas)
            .ok_or_else(|| ApiError::not_found("마일리지 정보를 찾을 수 없습니다"))
    }

    /// Replaces the term's areas after checking names and field schemas.
    pub fn put_areas(
        &self,
        term: &Term,
        areas: Vec<MileageArea>,
    ) -> Result<Vec<MileageArea>, ApiError> {
        validate_areas(&areas)?;
        let list = AreaList { areas };
        self.store
            .put(&term.document(AREAS), &list)
            .context("마일리지 정보 추가 중 오류가 발생했습니다")?;
        info!(
            areas = list.areas.len(),
            university = %term.university_code,
            "mileage areas saved"
        );
        Ok(list.areas)
    }

    /// Adds the course-completion preset in front of the other areas, or removes it.
    pub fn set_course_completion(
        &self,
        term: &Term,
        enabled: bool,
        name: Option<String>,
    ) -> Result<Vec<MileageArea>, ApiError> {
        let areas = self.area_list(term)?.unwrap_or_default().areas;
        let (existing, mut others): (Vec<_>, Vec<_>) =
            areas.into_iter().partition(|area| area.is_course_completion);

        if enabled {
            let name = name
                .map(|name| name.trim().to_string())
                .filter(|name| !name.is_empty())
                .or_else(|| existing.first().map(|area| area.name.clone()))
                .unwrap_or_else(|| COURSE_COMPLETION_AREA_NAME.to_string());
            let area = match existing.into_iter().next() {
                Some(mut current) => {
                    current.name = name;
                    current
                }
                None => MileageArea::course_completion(&name),
            };
            others.insert(0, area);
        }

        self.put_areas(term, others)
    }

    pub fn import_areas(&self, term: &Term, encoded: &str) -> Result<Vec<MileageArea>, ApiError> {
        let bytes = decode_upload(encoded).map_err(|_| SpreadsheetError::Encoding)?;
        let areas = workbook::read_areas(bytes).map_err(|err| {
            warn!(error = %err, university = %term.university_code, "area import rejected");
            err
        })?;
        self.put_areas(term, areas)
    }

    pub fn export_areas(&self, term: &Term) -> Result<SpreadsheetFile, ApiError> {
        let areas = self.areas(term)?;
        Ok(SpreadsheetFile {
            file_name: workbook::AREAS_FILE_NAME.to_string(),
            bytes: workbook::write_areas(&areas)?,
        })
    }

    fn course_list(&self, term: &Term) -> Result<Option<CourseList>, ApiError> {
        self.store
            .fetch(&term.document(COURSES))
            .context("교과목 목록을 가져오는 중 오류가 발생했습니다")
    }

    pub fn courses(&self, term: &Term) -> Result<Vec<Course>, ApiError> {
        self.course_list(term)?
            .map(|list| list.courses)
            .ok_or_else(|| ApiError::not_found("교과목 목록을 찾을 수 없습니다"))
    }

    pub fn put_courses(&self, term: &Term, courses: Vec<Course>) -> Result<Vec<Course>, ApiError> {
        let mut codes = HashSet::new();
        for course in &courses {
            if course.code.trim().is_empty() {
                return Err(ApiError::validation(MISSING_FIELDS));
            }
            if !codes.insert(course.code.as_str()) {
                return Err(ApiError::validation(format!(
                    "과목코드가 중복되었습니다: {}",
                    course.code
                )));
            }
        }

        let list = CourseList { courses };
        self.store
            .put(&term.document(COURSES), &list)
            .context("교과목 목록 추가 중 오류가 발생했습니다")?;
        Ok(list.courses)
    }

    pub fn import_courses(&self, term: &Term, encoded: &str) -> Result<Vec<Course>, ApiError> {
        let bytes = decode_upload(encoded).map_err(|_| SpreadsheetError::Encoding)?;
        let courses = workbook::read_courses(bytes).map_err(|err| {
            warn!(error = %err, university = %term.university_code, "course import rejected");
            err
        })?;
        self.put_courses(term, courses)
    }

    pub fn export_courses(&self, term: &Term) -> Result<SpreadsheetFile, ApiError> {
        let courses = self.courses(term)?;
        Ok(SpreadsheetFile {
            file_name: workbook::courses_file_name(&term.year, &term.semester),
            bytes: workbook::write_courses(&courses)?,
        })
    }

    fn activities_path(term: &Term, user_id: &str) -> DocumentPath {
        term.user_document(ACTIVITIES, user_id)
    }

    pub fn activities(&self, term: &Term, user_id: &str) -> Result<Vec<Activity>, ApiError> {
        Ok(self
            .store
            .fetch::<ActivityList>(&Self::activities_path(term, user_id))
            .context("활동 정보를 가져오는 중 오류가 발생했습니다")?
            .unwrap_or_default()
            .activities)
    }

    /// Validates the draft against its area, scores it and appends it to the student's list.
    pub fn add_activity(
        &self,
        term: &Term,
        user_id: &str,
        draft: ActivityDraft,
    ) -> Result<Activity, ApiError> {
        let areas = self.areas(term)?;
        let area = areas
            .iter()
            .find(|area| area.name == draft.area)
            .ok_or_else(|| {
                ApiError::validation(format!("존재하지 않는 영역입니다: {}", draft.area))
            })?;

        let course = match draft.course_code.as_deref().map(str::trim) {
            Some(code) if !code.is_empty() && area.is_course_completion => {
                let courses = self.course_list(term)?.unwrap_or_default().courses;
                let course = courses
                    .into_iter()
                    .find(|course| course.code == code)
                    .ok_or_else(|| {
                        ApiError::validation(format!("교과목 목록에 없는 과목입니다: {code}"))
                    })?;
                Some(course)
            }
            _ => None,
        };

        let activity = build_activity(area, draft.data, course.as_ref())?;

        let path = Self::activities_path(term, user_id);
        let mut list: ActivityList = self
            .store
            .fetch(&path)
            .context("활동 정보를 가져오는 중 오류가 발생했습니다")?
            .unwrap_or_default();
        list.activities.push(activity.clone());
        self.store
            .put(&path, &list)
            .context("활동 추가 중 오류가 발생했습니다")?;

        info!(
            user_id,
            area = %activity.area,
            points = activity.points,
            "mileage activity added"
        );
        Ok(activity)
    }

    pub fn remove_activity(
        &self,
        term: &Term,
        user_id: &str,
        activity_id: &str,
    ) -> Result<Vec<Activity>, ApiError> {
        let path = Self::activities_path(term, user_id);
        let mut list: ActivityList = self
            .store
            .fetch(&path)
            .context("활동 정보를 가져오는 중 오류가 발생했습니다")?
            .ok_or_else(|| ApiError::not_found("해당 사용자의 활동 정보가 없습니다"))?;

        let before = list.activities.len();
        list.activities.retain(|activity| activity.id != activity_id);
        if list.activities.len() == before {
            return Err(ApiError::not_found("활동 정보를 찾을 수 없습니다"));
        }

        self.store
            .put(&path, &list)
            .context("활동 삭제 중 오류가 발생했습니다")?;
        Ok(list.activities)
    }

    /// Snapshots the student's activities and profile, replacing any earlier application.
    pub fn submit_application(&self, term: &Term, user_id: &str) -> Result<Application, ApiError> {
        let activities = self.activities(term, user_id)?;
        if activities.is_empty() {
            return Err(ApiError::validation("제출할 활동이 없습니다"));
        }

        let application = Application {
            id: user_id.to_string(),
            total_points: activities.iter().map(|activity| activity.points).sum(),
            activities,
            student_info: self.students.student_info(user_id)?,
            submitted_at: Some(Utc::now()),
        };
        self.store
            .put(&term.submissions(APPLICATIONS).child(user_id), &application)
            .context("신청 제출 중 오류가 발생했습니다")?;

        info!(
            user_id,
            total_points = application.total_points,
            university = %term.university_code,
            "mileage application submitted"
        );
        Ok(application)
    }

    pub fn application(&self, term: &Term, user_id: &str) -> Result<Application, ApiError> {
        let mut application: Application = self
            .store
            .fetch(&term.submissions(APPLICATIONS).child(user_id))
            .context("신청 정보를 가져오는 중 오류가 발생했습니다")?
            .ok_or_else(|| ApiError::not_found("신청 정보를 찾을 수 없습니다"))?;
        application.id = user_id.to_string();
        Ok(application)
    }

    pub fn applications(&self, term: &Term) -> Result<Vec<Application>, ApiError> {
        Ok(self
            .store
            .fetch_all::<Application>(&term.submissions(APPLICATIONS))
            .context("신청 목록을 가져오는 중 오류가 발생했습니다")?
            .into_iter()
            .map(|(id, mut application)| {
                application.id = id;
                application
            })
            .collect())
    }

    pub fn export_application(
        &self,
        term: &Term,
        user_id: &str,
    ) -> Result<SpreadsheetFile, ApiError> {
        let application = self.application(term, user_id)?;
        let areas = self.area_list(term)?.unwrap_or_default().areas;
        Ok(SpreadsheetFile {
            file_name: workbook::application_file_name(&application.student_info.student_number),
            bytes: workbook::write_application(&application, &areas)?,
        })
    }
}

/// Excel caps worksheet names at 31 characters.
const MAX_SHEET_NAME_CHARS: usize = 31;
const FORBIDDEN_SHEET_CHARS: [char; 7] = ['[', ']', ':', '*', '?', '/', '\\'];

/// Area names become worksheet names on export, next to the student sheet.
fn validate_sheet_name(name: &str) -> Result<(), ApiError> {
    if name.chars().count() > MAX_SHEET_NAME_CHARS {
        return Err(ApiError::validation(format!(
            "영역 이름은 {MAX_SHEET_NAME_CHARS}자를 넘을 수 없습니다: {name}"
        )));
    }
    if name.contains(&FORBIDDEN_SHEET_CHARS[..]) || name.starts_with('\'') || name.ends_with('\'') {
        return Err(ApiError::validation(format!(
            "영역 이름에 사용할 수 없는 문자가 있습니다 ([ ] : * ? / \\ '): {name}"
        )));
    }
    if name == workbook::STUDENT_SHEET || name.eq_ignore_ascii_case("history") {
        return Err(ApiError::validation(format!(
            "\"{name}\"은(는) 영역 이름으로 사용할 수 없습니다"
        )));
    }
    Ok(())
}

fn validate_areas(areas: &[MileageArea]) -> Result<(), ApiError> {
    let mut names = HashSet::new();
    for area in areas {
        let name = area.name.trim();
        if name.is_empty() {
            return Err(ApiError::validation(MISSING_FIELDS));
        }
        validate_sheet_name(&area.name)?;
        if !names.insert(name.to_lowercase()) {
            return Err(ApiError::validation(format!(
                "영역 이름이 중복되었습니다: {name}"
            )));
        }

        let mut fields = HashSet::new();
        for field in &area.fields {
            if field.name.trim().is_empty() || !fields.insert(field.name.as_str()) {
                return Err(ApiError::validation(format!(
                    "\"{name}\" 영역의 필드 이름이 비어 있거나 중복되었습니다"
                )));
            }
        }
    }

    if areas.iter().filter(|area| area.is_course_completion).count() > 1 {
        return Err(ApiError::validation("교과목 이수 영역은 하나만 둘 수 있습니다"));
    }
    Ok(())
}
