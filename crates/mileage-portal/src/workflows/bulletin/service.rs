use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use serde_json::json;
use tracing::{info, warn};
use uuid::Uuid;

use super::domain::{Form, FormDraft, Notice, NoticeDraft, PopupNotice, PopupNoticeDraft};
use crate::error::{ApiError, StoreContext, MISSING_FIELDS};
use crate::storage::{BlobStore, DocumentPath, DocumentStore, DocumentStoreExt};
use crate::workflows::decode_upload;

const POPUP_NOTICES: &str = "popupNotices";

fn notices(university: &str) -> DocumentPath {
    DocumentPath::new([format!("notices_{university}")])
}

fn forms(university: &str) -> DocumentPath {
    DocumentPath::new([format!("forms_{university}")])
}

fn form_blob(university: &str, id: &str, file_name: &str) -> String {
    format!("forms/{university}/{id}/{file_name}")
}

fn popup_blob(university: &str) -> String {
    format!("{POPUP_NOTICES}/{university}")
}

fn decode(encoded: &str) -> Result<Vec<u8>, ApiError> {
    decode_upload(encoded).map_err(|_| ApiError::validation("업로드한 파일을 읽을 수 없습니다"))
}

/// University-wide announcements: notices, forms and the popup notice.
pub struct BulletinService<D, B> {
    store: Arc<D>,
    blobs: Arc<B>,
}

impl<D, B> BulletinService<D, B>
where
    D: DocumentStore + 'static,
    B: BlobStore + 'static,
{
    pub fn new(store: Arc<D>, blobs: Arc<B>) -> Self {
        Self { store, blobs }
    }

    /// Newest first.
    pub fn notices(&self, university: &str) -> Result<Vec<Notice>, ApiError> {
        let mut notices: Vec<Notice> = self
            .store
            .fetch_all::<Notice>(&notices(university))
            .context("공지사항을 가져오는 중 오류가 발생했습니다")?
            .into_iter()
            .map(|(id, mut notice)| {
                notice.id = id;
                notice
            })
            .collect();
        notices.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(notices)
    }

    pub fn add_notice(&self, university: &str, draft: NoticeDraft) -> Result<Notice, ApiError> {
        draft.validate()?;
        let notice = Notice {
            id: Uuid::new_v4().to_string(),
            title: draft.title,
            content: draft.content,
            author: draft.author,
            created_at: Utc::now(),
            updated_at: None,
        };
        self.store
            .put(&notices(university).child(&notice.id), &notice)
            .context("공지사항 추가 중 오류가 발생했습니다")?;

        info!(university, notice_id = %notice.id, "notice added");
        Ok(notice)
    }

    pub fn update_notice(
        &self,
        university: &str,
        id: &str,
        draft: NoticeDraft,
    ) -> Result<Notice, ApiError> {
        draft.validate()?;
        let path = notices(university).child(id);
        let mut notice: Notice = self
            .store
            .fetch(&path)
            .context("공지사항을 가져오는 중 오류가 발생했습니다")?
            .ok_or_else(|| ApiError::not_found("공지사항을 찾을 수 없습니다"))?;

        let updated_at = Utc::now();
        self.store
            .merge(
                &path,
                json!({
                    "title": draft.title,
                    "content": draft.content,
                    "author": draft.author,
                    "updatedAt": updated_at,
                }),
            )
            .context("공지사항 수정 중 오류가 발생했습니다")?;

        notice.id = id.to_string();
        notice.title = draft.title;
        notice.content = draft.content;
        notice.author = draft.author;
        notice.updated_at = Some(updated_at);
        Ok(notice)
    }

    pub fn delete_notice(&self, university: &str, id: &str) -> Result<(), ApiError> {
        let removed = self
            .store
            .delete(&notices(university).child(id))
            .context("공지사항 삭제 중 오류가 발생했습니다")?;
        if !removed {
            return Err(ApiError::not_found("공지사항을 찾을 수 없습니다"));
        }
        info!(university, notice_id = id, "notice deleted");
        Ok(())
    }

    pub fn forms(&self, university: &str) -> Result<Vec<Form>, ApiError> {
        let mut forms: Vec<Form> = self
            .store
            .fetch_all::<Form>(&forms(university))
            .context("양식을 가져오는 중 오류가 발생했습니다")?
            .into_iter()
            .map(|(id, mut form)| {
                form.id = id;
                form
            })
            .collect();
        forms.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(forms)
    }

    /// Uploads the file under `forms/{university}/{id}/{fileName}` and records its URL.
    pub fn add_form(&self, university: &str, draft: FormDraft) -> Result<Form, ApiError> {
        draft.validate()?;
        let (file, file_name) = draft
            .upload()?
            .ok_or_else(|| ApiError::validation(MISSING_FIELDS))?;
        let bytes = decode(file)?;

        let id = Uuid::new_v4().to_string();
        let download_url = self
            .blobs
            .upload(&form_blob(university, &id, file_name), bytes)
            .context("양식 파일 업로드 중 오류가 발생했습니다")?;

        let form = Form {
            id,
            title: draft.title.clone(),
            content: draft.content.clone(),
            author: draft.author.clone(),
            download_url,
            file_name: file_name.to_string(),
            created_at: Utc::now(),
        };
        self.store
            .put(&forms(university).child(&form.id), &form)
            .context("양식 추가 중 오류가 발생했습니다")?;

        info!(university, form_id = %form.id, file_name = %form.file_name, "form added");
        Ok(form)
    }

    /// Edits the text fields and, when a new file is attached, swaps the stored file.
    pub fn update_form(
        &self,
        university: &str,
        id: &str,
        draft: FormDraft,
    ) -> Result<Form, ApiError> {
        draft.validate()?;
        let path = forms(university).child(id);
        let mut form: Form = self
            .store
            .fetch(&path)
            .context("양식을 가져오는 중 오류가 발생했습니다")?
            .ok_or_else(|| ApiError::not_found("양식을 찾을 수 없습니다"))?;
        form.id = id.to_string();

        if let Some((file, file_name)) = draft.upload()? {
            let bytes = decode(file)?;
            let download_url = self
                .blobs
                .upload(&form_blob(university, id, file_name), bytes)
                .context("양식 파일 업로드 중 오류가 발생했습니다")?;
            if !form.file_name.is_empty() && form.file_name != file_name {
                self.remove_blob(&form_blob(university, id, &form.file_name));
            }
            form.download_url = download_url;
            form.file_name = file_name.to_string();
        }

        form.title = draft.title;
        form.content = draft.content;
        form.author = draft.author;
        self.store
            .merge(
                &path,
                json!({
                    "title": form.title,
                    "content": form.content,
                    "author": form.author,
                    "downloadURL": form.download_url,
                    "fileName": form.file_name,
                }),
            )
            .context("양식 수정 중 오류가 발생했습니다")?;
        Ok(form)
    }

    pub fn delete_form(&self, university: &str, id: &str) -> Result<(), ApiError> {
        let path = forms(university).child(id);
        let form: Form = self
            .store
            .fetch(&path)
            .context("양식을 가져오는 중 오류가 발생했습니다")?
            .ok_or_else(|| ApiError::not_found("양식을 찾을 수 없습니다"))?;

        self.store
            .delete(&path)
            .context("양식 삭제 중 오류가 발생했습니다")?;
        if !form.file_name.is_empty() {
            self.remove_blob(&form_blob(university, id, &form.file_name));
        }

        info!(university, form_id = id, "form deleted");
        Ok(())
    }

    /// The popup notice, or `None` once its expiry day has passed.
    pub fn popup_notice(
        &self,
        university: &str,
        today: NaiveDate,
    ) -> Result<Option<PopupNotice>, ApiError> {
        let popup: Option<PopupNotice> = self
            .store
            .fetch(&DocumentPath::new([POPUP_NOTICES, university]))
            .context("팝업 공지를 가져오는 중 오류가 발생했습니다")?;
        Ok(popup.filter(|popup| popup.is_visible_on(today)))
    }

    pub fn put_popup_notice(
        &self,
        university: &str,
        draft: PopupNoticeDraft,
    ) -> Result<PopupNotice, ApiError> {
        let expiry_date = draft.expiry()?;
        let bytes = decode(&draft.image)?;
        let image_url = self
            .blobs
            .upload(&popup_blob(university), bytes)
            .context("팝업 공지 추가 중 오류가 발생했습니다")?;

        let popup = PopupNotice {
            title: draft.title.trim().to_string(),
            image_url,
            expiry_date,
            updated_at: Utc::now(),
        };
        self.store
            .put(&DocumentPath::new([POPUP_NOTICES, university]), &popup)
            .context("팝업 공지 추가 중 오류가 발생했습니다")?;

        info!(university, expiry = %popup.expiry_date, "popup notice replaced");
        Ok(popup)
    }

    fn remove_blob(&self, path: &str) {
        if let Err(err) = self.blobs.remove(path) {
            warn!(error = %err, path, "stale blob left behind");
        }
    }
}
