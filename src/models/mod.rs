pub mod alert;
pub mod auth;
pub mod child;
pub mod document;
pub mod health;
pub mod notification;
pub mod nutrition;
pub mod orphanage;
pub mod partner;
pub mod reference;
pub mod report;
pub mod stats;
pub mod user;
