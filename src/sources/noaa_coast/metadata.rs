//! Project metadata published next to each NOAA Coast imagery project.
//! Both ISO 19139 and FGDC documents are read by element name.

use crate::utils::error::Result;
use quick_xml::events::Event;
use quick_xml::Reader;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProjectMetadata {
    pub title: Option<String>,
    pub description: Option<String>,
    pub processing: Vec<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

#[derive(Default)]
struct Found {
    title: Option<String>,
    abstract_text: Option<String>,
    processing: Vec<String>,
    begin: Option<String>,
    end: Option<String>,
    instant: Option<String>,
}

fn first(slot: &mut Option<String>, value: &str) {
    if slot.is_none() {
        *slot = Some(value.to_string());
    }
}

fn record(found: &mut Found, path: &[String], text: &str) {
    let has = |name: &str| path.iter().any(|p| p == name);
    let last = path.last().map(String::as_str).unwrap_or_default();
    let parent = path
        .len()
        .checked_sub(2)
        .and_then(|i| path.get(i))
        .map(String::as_str)
        .unwrap_or_default();

    match last {
        "beginPosition" => first(&mut found.begin, text),
        "endPosition" => first(&mut found.end, text),
        "timePosition" => first(&mut found.instant, text),
        "title" if has("citeinfo") && has("idinfo") => first(&mut found.title, text),
        "CharacterString" if parent == "title" && has("identificationInfo") && has("citation") => {
            first(&mut found.title, text)
        }
        "abstract" => first(&mut found.abstract_text, text),
        "CharacterString" if parent == "abstract" => first(&mut found.abstract_text, text),
        "procdesc" if has("procstep") => found.processing.push(text.to_string()),
        "CharacterString" if parent == "description" && has("LI_ProcessStep") => {
            found.processing.push(text.to_string())
        }
        _ => {}
    }
}

/// Reads title, abstract, process steps and the temporal extent.
///
/// The temporal extent is `beginPosition`/`endPosition`, or a single
/// `timePosition` used as both ends, or nothing.
pub fn parse_project_metadata(xml: &str) -> Result<ProjectMetadata> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);

    let mut path: Vec<String> = Vec::new();
    let mut text = String::new();
    let mut found = Found::default();

    loop {
        match reader.read_event()? {
            Event::Start(ref e) => {
                path.push(String::from_utf8_lossy(e.local_name().as_ref()).to_string());
                text.clear();
            }
            Event::Text(e) => text.push_str(&e.unescape()?),
            Event::CData(e) => text.push_str(&String::from_utf8_lossy(&e)),
            Event::End(_) => {
                let value = text.trim();
                if !value.is_empty() {
                    record(&mut found, &path, value);
                }
                text.clear();
                path.pop();
            }
            Event::Eof => break,
            _ => {}
        }
    }

    let (start_date, end_date) = match (found.begin, found.end) {
        (None, None) => (found.instant.clone(), found.instant),
        (begin, end) => (begin, end),
    };

    Ok(ProjectMetadata {
        title: found.title,
        description: found.abstract_text,
        processing: found.processing,
        start_date,
        end_date,
    })
}
