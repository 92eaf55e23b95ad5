//! Certificate template and course reference persistence.

use sqlx::PgPool;
use uuid::Uuid;

use certreg_core::{CertificateTemplate, CourseReference};
use certreg_registry::StoreError;

use super::store_error;

/// Insert a new certificate template.
pub async fn insert_template(pool: &PgPool, template: &CertificateTemplate) -> Result<(), StoreError> {
    sqlx::query(
        "INSERT INTO certificate_templates (id, name, primary_color, secondary_color, logo_url)
         VALUES ($1, $2, $3, $4, $5)",
    )
    .bind(template.id)
    .bind(&template.name)
    .bind(template.primary_color.as_str())
    .bind(template.secondary_color.as_str())
    .bind(&template.logo_url)
    .execute(pool)
    .await
    .map_err(store_error)?;
    Ok(())
}

/// Fetch a template by ID.
pub async fn get_template(pool: &PgPool, id: Uuid) -> Result<Option<CertificateTemplate>, StoreError> {
    let row = sqlx::query_as::<_, TemplateRow>(
        "SELECT id, name, primary_color, secondary_color, logo_url
         FROM certificate_templates WHERE id = $1",
    )
    .bind(id)
    .fetch_optional(pool)
    .await
    .map_err(store_error)?;
    row.map(TemplateRow::into_record).transpose()
}

/// Insert or refresh a course reference.
pub async fn upsert_course(pool: &PgPool, course: &CourseReference) -> Result<(), StoreError> {
    sqlx::query(
        "INSERT INTO course_references (id, title, instructor_name, url, updated_at)
         VALUES ($1, $2, $3, $4, now())
         ON CONFLICT (id) DO UPDATE
         SET title = EXCLUDED.title,
             instructor_name = EXCLUDED.instructor_name,
             url = EXCLUDED.url,
             updated_at = now()",
    )
    .bind(course.id)
    .bind(&course.title)
    .bind(&course.instructor_name)
    .bind(&course.url)
    .execute(pool)
    .await
    .map_err(store_error)?;
    Ok(())
}

/// Fetch a course reference by ID.
pub async fn get_course(pool: &PgPool, id: Uuid) -> Result<Option<CourseReference>, StoreError> {
    let row = sqlx::query_as::<_, CourseRow>(
        "SELECT id, title, instructor_name, url FROM course_references WHERE id = $1",
    )
    .bind(id)
    .fetch_optional(pool)
    .await
    .map_err(store_error)?;
    row.map(CourseRow::into_record).transpose()
}

#[derive(sqlx::FromRow)]
struct TemplateRow {
    id: Uuid,
    name: String,
    primary_color: String,
    secondary_color: String,
    logo_url: Option<String>,
}

impl TemplateRow {
    fn into_record(self) -> Result<CertificateTemplate, StoreError> {
        let id = self.id;
        let mut template =
            CertificateTemplate::new(self.name, self.primary_color, self.secondary_color, self.logo_url)
                .map_err(|e| StoreError::Corrupt(format!("template {id}: {e}")))?;
        template.id = id;
        Ok(template)
    }
}

#[derive(sqlx::FromRow)]
struct CourseRow {
    id: Uuid,
    title: String,
    instructor_name: String,
    url: Option<String>,
}

impl CourseRow {
    fn into_record(self) -> Result<CourseReference, StoreError> {
        let id = self.id;
        CourseReference::new(id, self.title, self.instructor_name, self.url)
            .map_err(|e| StoreError::Corrupt(format!("course {id}: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn template_row_keeps_stored_id() {
        let id = Uuid::new_v4();
        let template = TemplateRow {
            id,
            name: "Classic".to_string(),
            primary_color: "#003366".to_string(),
            secondary_color: "#FFCC00".to_string(),
            logo_url: None,
        }
        .into_record()
        .unwrap();
        assert_eq!(template.id, id);
        assert_eq!(template.secondary_color.as_str(), "#ffcc00");
    }

    #[test]
    fn template_row_with_bad_color_is_corrupt() {
        let err = TemplateRow {
            id: Uuid::new_v4(),
            name: "Classic".to_string(),
            primary_color: "navy".to_string(),
            secondary_color: "#ffcc00".to_string(),
            logo_url: None,
        }
        .into_record()
        .unwrap_err();
        assert!(matches!(err, StoreError::Corrupt(_)));
    }

    #[test]
    fn course_row_converts() {
        let id = Uuid::new_v4();
        let course = CourseRow {
            id,
            title: "Intro to Algorithms".to_string(),
            instructor_name: "Grace Hopper".to_string(),
            url: Some("https://courses.example.org/algo".to_string()),
        }
        .into_record()
        .unwrap();
        assert_eq!(course.id, id);
        assert_eq!(course.title, "Intro to Algorithms");
    }
}
