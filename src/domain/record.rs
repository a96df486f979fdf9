use serde::{Deserialize, Serialize};

pub const NOT_FOUND: &str = "Not found";

/// `company` is not read from the record element: it comes from the page
/// title ("<X> employees") and is wrong whenever the title is phrased
/// differently, so treat it as a low-confidence field.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Record {
    pub name: String,
    pub title: String,
    pub location: String,
    pub profile_url: String,
    pub company: String,
    pub extracted_at: String,
}

impl Record {
    pub fn new(extracted_at: &str) -> Self {
        Record {
            name: NOT_FOUND.to_string(),
            title: NOT_FOUND.to_string(),
            location: NOT_FOUND.to_string(),
            profile_url: NOT_FOUND.to_string(),
            company: NOT_FOUND.to_string(),
            extracted_at: extracted_at.to_string(),
        }
    }

    pub fn has_name(&self) -> bool {
        self.name != NOT_FOUND
    }

    pub fn has_title(&self) -> bool {
        self.title != NOT_FOUND
    }

    pub fn has_location(&self) -> bool {
        self.location != NOT_FOUND
    }

    pub fn has_profile_url(&self) -> bool {
        self.profile_url != NOT_FOUND
    }
}
