pub mod entity;
pub mod mailer;
pub mod repository;
pub mod service;
pub mod value_object;
