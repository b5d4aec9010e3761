pub mod profile;
pub mod referral_lead;
pub mod visitor_session;

pub use profile::Entity as ProfileEntity;
pub use referral_lead::Entity as ReferralLeadEntity;
pub use visitor_session::Entity as VisitorSessionEntity;
