pub mod accounts;
pub mod alerts;
pub mod children;
pub mod documents;
pub mod email;
pub mod health;
pub mod metrics;
pub mod notifications;
pub mod nutrition;
pub mod orphanages;
pub mod partners;
pub mod reference;
pub mod reports;
pub mod stats;
