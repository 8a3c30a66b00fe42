pub mod coordinate;
pub mod request;
pub mod response;
pub mod series;
pub mod variable;
