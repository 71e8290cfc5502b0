pub mod company;
pub mod employee;
pub mod media;
