pub mod evaluation;
pub mod question;
pub mod test_result;
pub mod user;
