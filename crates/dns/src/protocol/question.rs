use std::fmt;

use serde::Serialize;

use super::{record_class::RecordClass, record_type::RecordType};

// Question section format https://datatracker.ietf.org/doc/html/rfc1035#section-4.1.2
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Question {
    pub domain_name: String,
    pub r#type: RecordType,
    pub class: RecordClass,
}

impl fmt::Display for Question {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.domain_name, self.class, self.r#type)
    }
}
