pub mod header;
pub mod question;
pub mod record;
pub mod record_class;
pub mod record_type;
pub mod response_code;
