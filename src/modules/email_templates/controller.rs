use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use uuid::Uuid;

use crate::state::AppState;
use crate::utils::crud::CrudService;
use crate::utils::errors::AppError;
use crate::utils::pagination::PaginatedResponse;
use crate::validator::ValidatedJson;

use crate::utils::email::EmailService;

use super::model::{
    CreateEmailTemplateDto, EmailTemplate, EmailTemplateFilterParams, PreviewEmailTemplateDto,
    RenderBodyDto, RenderedTemplate, SendEmailTemplateDto, UpdateEmailTemplateDto, render_template,
};
use super::service::EmailTemplateService;

pub async fn get_email_templates(
    State(state): State<AppState>,
    Query(params): Query<EmailTemplateFilterParams>,
) -> Result<Json<PaginatedResponse<EmailTemplate>>, AppError> {
    let service = EmailTemplateService::new(state.db.clone());
    let page = service.find_filtered(&params).await?;
    let meta = params.pagination.meta(page.total, page.items.len());
    Ok(Json(PaginatedResponse {
        data: page.items,
        meta,
    }))
}

pub async fn get_email_template_by_id(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<EmailTemplate>, AppError> {
    let service = EmailTemplateService::new(state.db.clone());
    let template = service.find_one_by_id(id).await?;
    Ok(Json(template))
}

pub async fn create_email_template(
    State(state): State<AppState>,
    ValidatedJson(dto): ValidatedJson<CreateEmailTemplateDto>,
) -> Result<(StatusCode, Json<EmailTemplate>), AppError> {
    let service = EmailTemplateService::new(state.db.clone());
    let template = service.create(dto).await?;
    Ok((StatusCode::CREATED, Json(template)))
}

pub async fn update_email_template(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    ValidatedJson(dto): ValidatedJson<UpdateEmailTemplateDto>,
) -> Result<Json<EmailTemplate>, AppError> {
    let service = EmailTemplateService::new(state.db.clone());
    let template = service.update(id, dto).await?;
    Ok(Json(template))
}

pub async fn delete_email_template(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    let service = EmailTemplateService::new(state.db.clone());
    service.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Renders an ad-hoc subject/body pair against a variable map, for drafting
/// a template before it is stored.
pub async fn render_preview(
    ValidatedJson(dto): ValidatedJson<RenderBodyDto>,
) -> Json<RenderedTemplate> {
    Json(RenderedTemplate {
        subject: render_template(&dto.subject, &dto.variables),
        body: render_template(&dto.body, &dto.variables),
    })
}

/// Renders a stored template with the supplied variables without sending
/// anything.
pub async fn preview_email_template(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(dto): Json<PreviewEmailTemplateDto>,
) -> Result<Json<RenderedTemplate>, AppError> {
    let service = EmailTemplateService::new(state.db.clone());
    let template = service.find_one_by_id(id).await?;
    Ok(Json(template.render(&dto.variables)))
}

/// Renders a template and delivers it to the given recipient, so an admin
/// can see the result in a real inbox before wiring the template up.
pub async fn send_email_template(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    ValidatedJson(dto): ValidatedJson<SendEmailTemplateDto>,
) -> Result<StatusCode, AppError> {
    let service = EmailTemplateService::new(state.db.clone());
    let template = service.find_one_by_id(id).await?;
    let rendered = template.render(&dto.variables);

    let email = EmailService::new(state.email_config.clone());
    email
        .send_rendered(&dto.to_email, &rendered.subject, &rendered.body)
        .await?;
    Ok(StatusCode::ACCEPTED)
}
