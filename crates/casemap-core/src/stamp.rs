use crate::case::CaseMetadata;
use crate::document::DocumentStore;
use crate::error::{Error, Result, Stage};
use chrono::NaiveDate;

fn fields<'a>(meta: &'a CaseMetadata, date: &'a str) -> [(&'static str, &'a str); 5] {
    [
        ("{project_name}", meta.project_name.as_str()),
        ("{case_id}", meta.case_id.as_str()),
        ("{project_manager}", meta.project_manager.as_str()),
        ("{carto_code}", meta.carto_code.as_str()),
        ("{date}", date),
    ]
}

/// Fills the case placeholders of a template. Unknown placeholders are left as written.
pub fn render_template(template: &str, meta: &CaseMetadata, date: NaiveDate) -> String {
    if !template.contains('{') {
        return template.to_string();
    }
    let date = date.format("%B %-d, %Y").to_string();
    let mut out = template.to_string();
    for (placeholder, value) in fields(meta, &date) {
        out = out.replace(placeholder, value);
    }
    out
}

/// Stamps every text element of `layout`; returns how many were written.
pub fn stamp_layout<D: DocumentStore + ?Sized>(
    store: &mut D,
    layout: &str,
    meta: &CaseMetadata,
    date: NaiveDate,
) -> Result<usize> {
    let resource = format!("layout `{layout}`");
    let elements = store
        .text_elements(layout)
        .map_err(|source| Error::store(Stage::Stamping, &resource, source))?;
    for element in &elements {
        let text = render_template(&element.template, meta, date);
        store
            .set_text(layout, &element.name, &text)
            .map_err(|source| Error::store(Stage::Stamping, &resource, source))?;
    }
    tracing::debug!(layout, elements = elements.len(), "stamped layout text");
    Ok(elements.len())
}
