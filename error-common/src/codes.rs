// Error codes shared by every crate in the workspace

pub mod validation {
    pub const INVALID_INPUT: &str = "VALIDATION_1001";
}

pub mod authentication {
    pub const SESSION_EXPIRED: &str = "AUTH_2002";
}

pub mod backend {
    pub const UNREACHABLE: &str = "BACKEND_3001";
    pub const UNEXPECTED_STATUS: &str = "BACKEND_3002";
    pub const MALFORMED_RESPONSE: &str = "BACKEND_3003";
    pub const NOT_FOUND: &str = "BACKEND_3004";
}

pub mod billing {
    pub const APPOINTMENT_NOT_ATTENDED: &str = "BILLING_4001";
    pub const APPOINTMENT_ALREADY_INVOICED: &str = "BILLING_4002";
    pub const UNIT_VALUE_UNAVAILABLE: &str = "BILLING_4003";
}

pub mod system {
    pub const CONFIGURATION: &str = "SYS_5001";
    pub const INTERNAL: &str = "SYS_5002";
}
