use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

use crate::utils::pagination::PaginationParams;

/// A stored mail template. `subject` and `body` may contain `{{name}}`
/// placeholders filled in at render time.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct EmailTemplate {
    pub id: Uuid,
    pub name: String,
    pub subject: String,
    pub body: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<chrono::DateTime<chrono::Utc>>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateEmailTemplateDto {
    #[validate(length(min = 1, message = "Template name must not be empty"))]
    pub name: String,
    #[validate(length(min = 1, message = "Subject must not be empty"))]
    pub subject: String,
    #[validate(length(min = 1, message = "Body must not be empty"))]
    pub body: String,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct UpdateEmailTemplateDto {
    #[validate(length(min = 1, message = "Template name must not be empty"))]
    pub name: Option<String>,
    #[validate(length(min = 1, message = "Subject must not be empty"))]
    pub subject: Option<String>,
    #[validate(length(min = 1, message = "Body must not be empty"))]
    pub body: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PreviewEmailTemplateDto {
    #[serde(default)]
    pub variables: HashMap<String, String>,
}

/// Ad-hoc rendering input: a subject/body pair that is not stored anywhere.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct RenderBodyDto {
    #[serde(default)]
    pub subject: String,
    #[validate(length(min = 1, message = "Body must not be empty"))]
    pub body: String,
    #[serde(default)]
    pub variables: HashMap<String, String>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct SendEmailTemplateDto {
    #[validate(email(message = "A valid recipient email is required"))]
    pub to_email: String,
    #[serde(default)]
    pub variables: HashMap<String, String>,
}

#[derive(Debug, Serialize)]
pub struct RenderedTemplate {
    pub subject: String,
    pub body: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EmailTemplateFilterParams {
    pub name: Option<String>,
    #[serde(flatten)]
    pub pagination: PaginationParams,
}

/// Replaces every `{{key}}` with its value. Unknown placeholders stay in
/// place so a preview makes the gap visible.
pub fn render_template(template: &str, variables: &HashMap<String, String>) -> String {
    let mut rendered = template.to_string();
    for (key, value) in variables {
        rendered = rendered.replace(&format!("{{{{{}}}}}", key), value);
    }
    rendered
}

impl EmailTemplate {
    pub fn render(&self, variables: &HashMap<String, String>) -> RenderedTemplate {
        RenderedTemplate {
            subject: render_template(&self.subject, variables),
            body: render_template(&self.body, variables),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_substitutes_placeholders() {
        let mut vars = HashMap::new();
        vars.insert("name".to_string(), "Ada".to_string());
        vars.insert("link".to_string(), "https://example.com".to_string());
        assert_eq!(
            render_template("Hi {{name}}, visit {{link}}", &vars),
            "Hi Ada, visit https://example.com"
        );
    }

    #[test]
    fn test_render_keeps_unknown_placeholders() {
        let vars = HashMap::new();
        assert_eq!(render_template("Hi {{name}}", &vars), "Hi {{name}}");
    }

    #[test]
    fn test_render_repeated_placeholder() {
        let mut vars = HashMap::new();
        vars.insert("x".to_string(), "1".to_string());
        assert_eq!(render_template("{{x}}+{{x}}", &vars), "1+1");
    }
}
