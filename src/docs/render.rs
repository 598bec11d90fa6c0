use askama::Template;
use std::collections::HashSet;
use std::fmt;
use std::io::{self, Write};

use super::model::Documentation;

#[derive(Debug)]
pub enum RenderError {
    Json(serde_json::Error),
    Template(askama::Error),
    Io(io::Error),
}

impl fmt::Display for RenderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RenderError::Json(e) => write!(f, "failed to encode documentation: {e}"),
            RenderError::Template(e) => write!(f, "failed to render documentation page: {e}"),
            RenderError::Io(e) => write!(f, "failed to write documentation: {e}"),
        }
    }
}

impl std::error::Error for RenderError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RenderError::Json(e) => Some(e),
            RenderError::Template(e) => Some(e),
            RenderError::Io(e) => Some(e),
        }
    }
}

impl From<io::Error> for RenderError {
    fn from(e: io::Error) -> Self {
        RenderError::Io(e)
    }
}

/// Write the documentation as one JSON document followed by a newline.
///
/// # Errors
///
/// Returns [`RenderError::Json`] if encoding or writing fails.
pub fn to_writer<W: Write>(
    docs: &Documentation,
    mut writer: W,
    pretty: bool,
) -> Result<(), RenderError> {
    if pretty {
        serde_json::to_writer_pretty(&mut writer, docs).map_err(RenderError::Json)?;
    } else {
        serde_json::to_writer(&mut writer, docs).map_err(RenderError::Json)?;
    }
    writer.write_all(b"\n")?;
    writer.flush()?;
    Ok(())
}

struct EndpointView {
    anchor: String,
    func: String,
    method: String,
    url: String,
    doc: String,
    has_response: bool,
    response_json: String,
}

struct GroupView {
    name: String,
    doc: String,
    endpoints: Vec<EndpointView>,
}

#[derive(Template)]
#[template(path = "docs.html")]
struct DocsPage {
    title: String,
    groups: Vec<GroupView>,
}

fn slug(text: &str) -> String {
    text.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
                c
            } else {
                '-'
            }
        })
        .collect()
}

fn page(docs: &Documentation, title: &str) -> Result<DocsPage, RenderError> {
    let mut anchors = HashSet::new();
    let mut groups = Vec::with_capacity(docs.len());
    for (name, group) in docs {
        let mut endpoints = Vec::with_capacity(group.endpoints.len());
        for endpoint in &group.endpoints {
            let base = format!("{}-{}", slug(name), slug(&endpoint.func));
            let mut anchor = base.clone();
            let mut n = 1;
            while !anchors.insert(anchor.clone()) {
                n += 1;
                anchor = format!("{base}-{n}");
            }
            let has_response = !endpoint.response.is_null();
            let response_json = if has_response {
                serde_json::to_string_pretty(&endpoint.response).map_err(RenderError::Json)?
            } else {
                String::new()
            };
            endpoints.push(EndpointView {
                anchor,
                func: endpoint.func.clone(),
                method: endpoint.method.clone(),
                url: endpoint.url.clone(),
                doc: endpoint.doc.clone(),
                has_response,
                response_json,
            });
        }
        groups.push(GroupView {
            name: name.clone(),
            doc: group.doc.clone(),
            endpoints,
        });
    }
    Ok(DocsPage {
        title: title.to_string(),
        groups,
    })
}

/// Render the documentation as a standalone HTML page.
///
/// Doc comments are inserted verbatim, markup included; everything else is
/// escaped.
///
/// # Errors
///
/// Returns [`RenderError`] if a sample response cannot be encoded or the
/// template fails.
pub fn render_html(docs: &Documentation, title: &str) -> Result<String, RenderError> {
    page(docs, title)?.render().map_err(RenderError::Template)
}

/// [`render_html`] into a writer.
///
/// # Errors
///
/// As [`render_html`], plus [`RenderError::Io`].
pub fn write_html<W: Write>(docs: &Documentation, title: &str, mut writer: W) -> Result<(), RenderError> {
    let html = render_html(docs, title)?;
    writer.write_all(html.as_bytes())?;
    writer.flush()?;
    Ok(())
}
