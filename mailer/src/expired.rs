//! Expiry notifications.

use crate::Notification;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EmailType {
    ShiftExpired,
    ShiftApplicationExpired,
}

/// One recipient of a shift expiry email. Used for both facilities and
/// applicants.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShiftNotice {
    pub email: String,
    pub facility_name: String,
    pub shift_date: String,
    pub shift_time: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShiftExpired {
    #[serde(rename = "type")]
    pub kind: EmailType,
    pub providers: Vec<ShiftNotice>,
    pub facilities: Vec<ShiftNotice>,
}

impl ShiftExpired {
    pub fn new(providers: Vec<ShiftNotice>, facilities: Vec<ShiftNotice>) -> Self {
        Self {
            kind: EmailType::ShiftExpired,
            providers,
            facilities,
        }
    }
}

impl Notification for ShiftExpired {
    const PATH: &'static str = "/send-shift-expired";
}

/// Tells a provider their application lapsed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderApplicationNotice {
    pub email: String,
    pub facility_name: String,
    pub shift_date: String,
    pub shift_time: String,
    pub shift_url: String,
}

/// Tells a facility an application to one of its shifts lapsed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FacilityApplicationNotice {
    pub email: String,
    pub facility_name: String,
    pub provider_name: String,
    pub shift_date: String,
    pub shift_time: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplicationExpired {
    #[serde(rename = "type")]
    pub kind: EmailType,
    pub providers: Vec<ProviderApplicationNotice>,
    pub facilities: Vec<FacilityApplicationNotice>,
}

impl ApplicationExpired {
    pub fn new(
        providers: Vec<ProviderApplicationNotice>,
        facilities: Vec<FacilityApplicationNotice>,
    ) -> Self {
        Self {
            kind: EmailType::ShiftApplicationExpired,
            providers,
            facilities,
        }
    }
}

impl Notification for ApplicationExpired {
    const PATH: &'static str = "/send-application-expired";
}
