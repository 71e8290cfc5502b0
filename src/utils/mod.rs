pub mod actor;
pub mod jwt;
pub mod media;
pub mod pagination;
pub mod permissions;
pub mod s3;
pub mod validation;
