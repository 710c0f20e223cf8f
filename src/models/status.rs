//! Status enums shared by the entity models.
//!
//! The `status_enum!` macro generates a serde-compatible enum from a
//! declarative list of `Variant => "wire", "Label"` triples. Unrecognised
//! wire strings land on a trailing `Unknown` variant instead of failing the
//! whole page.

use crate::list::Tone;

/// Generate a status enum with wire names, display labels and an `Unknown` fallback.
///
/// # Usage
///
/// ```ignore
/// status_enum! {
///     /// Invoice payment status
///     InvoiceStatus {
///         Paid => "paid", "Paid",
///         Unpaid => "unpaid", "Unpaid",
///     }
/// }
/// ```
macro_rules! status_enum {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $wire:literal, $label:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
        pub enum $name {
            $(
                #[serde(rename = $wire)]
                $variant,
            )+
            #[serde(other, rename = "unknown")]
            Unknown,
        }

        impl $name {
            /// Every known variant in declaration order
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            /// Wire names, used as filter choices
            pub const WIRE: &'static [&'static str] = &[$($wire),+];

            #[must_use]
            pub fn as_str(self) -> &'static str {
                match self {
                    $($name::$variant => $wire,)+
                    $name::Unknown => "unknown",
                }
            }

            #[must_use]
            pub fn label(self) -> &'static str {
                match self {
                    $($name::$variant => $label,)+
                    $name::Unknown => "Unknown",
                }
            }

            /// Parse a wire or display name, case-insensitively
            #[must_use]
            pub fn parse(s: &str) -> Self {
                let s = s.trim();
                Self::ALL
                    .iter()
                    .copied()
                    .find(|v| v.as_str().eq_ignore_ascii_case(s) || v.label().eq_ignore_ascii_case(s))
                    .unwrap_or($name::Unknown)
            }
        }

        impl Default for $name {
            fn default() -> Self {
                $name::Unknown
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.label())
            }
        }
    };
}

pub(crate) use status_enum;

status_enum! {
    /// Lifecycle state of a tenant account
    TenantStatus {
        Active => "active", "Active",
        Trial => "trial", "Trial",
        Suspended => "suspended", "Suspended",
        Deactivated => "deactivated", "Deactivated",
        SubscriptionCancelled => "subscription_cancelled", "Subscription Cancelled",
        Unverified => "unverified", "Unverified",
        Locked => "locked", "Locked",
    }
}

impl TenantStatus {
    #[must_use]
    pub fn tone(self) -> Tone {
        match self {
            TenantStatus::Active => Tone::Positive,
            TenantStatus::Trial => Tone::Info,
            TenantStatus::Suspended | TenantStatus::Locked => Tone::Warning,
            TenantStatus::Deactivated | TenantStatus::SubscriptionCancelled => Tone::Negative,
            TenantStatus::Unverified | TenantStatus::Unknown => Tone::Muted,
        }
    }
}

status_enum! {
    /// Billing state of a tenant subscription
    SubscriptionStatus {
        Active => "active", "Active",
        Suspended => "suspended", "Suspended",
        Cancelled => "cancelled", "Cancelled",
        PastDue => "past_due", "Past Due",
    }
}

impl SubscriptionStatus {
    #[must_use]
    pub fn tone(self) -> Tone {
        match self {
            SubscriptionStatus::Active => Tone::Positive,
            SubscriptionStatus::Suspended | SubscriptionStatus::PastDue => Tone::Warning,
            SubscriptionStatus::Cancelled => Tone::Negative,
            SubscriptionStatus::Unknown => Tone::Muted,
        }
    }
}

status_enum! {
    /// Payment state of an invoice as stored by the backend
    InvoiceStatus {
        Paid => "paid", "Paid",
        Unpaid => "unpaid", "Unpaid",
        Overdue => "overdue", "Overdue",
        Cancelled => "cancelled", "Cancelled",
        Refunded => "refunded", "Refunded",
    }
}

impl InvoiceStatus {
    #[must_use]
    pub fn tone(self) -> Tone {
        match self {
            InvoiceStatus::Paid => Tone::Positive,
            InvoiceStatus::Unpaid => Tone::Warning,
            InvoiceStatus::Overdue => Tone::Negative,
            InvoiceStatus::Cancelled | InvoiceStatus::Refunded | InvoiceStatus::Unknown => Tone::Muted,
        }
    }
}

status_enum! {
    /// Recovery progress of a deleted document
    RecoveryStatus {
        Pending => "pending", "Pending",
        InProgress => "in_progress", "In Progress",
        Recovered => "recovered", "Recovered",
        Failed => "failed", "Failed",
    }
}

impl RecoveryStatus {
    #[must_use]
    pub fn tone(self) -> Tone {
        match self {
            RecoveryStatus::Pending => Tone::Warning,
            RecoveryStatus::InProgress => Tone::Info,
            RecoveryStatus::Recovered => Tone::Positive,
            RecoveryStatus::Failed => Tone::Negative,
            RecoveryStatus::Unknown => Tone::Muted,
        }
    }
}

status_enum! {
    /// Severity of an error log entry
    LogLevel {
        Info => "info", "Info",
        Warning => "warning", "Warning",
        Error => "error", "Error",
        Critical => "critical", "Critical",
    }
}

impl LogLevel {
    #[must_use]
    pub fn tone(self) -> Tone {
        match self {
            LogLevel::Info => Tone::Info,
            LogLevel::Warning => Tone::Warning,
            LogLevel::Error | LogLevel::Critical => Tone::Negative,
            LogLevel::Unknown => Tone::Muted,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_round_trip() {
        let status: TenantStatus = serde_json::from_str(r#""subscription_cancelled""#).unwrap();
        assert_eq!(status, TenantStatus::SubscriptionCancelled);
        assert_eq!(serde_json::to_string(&status).unwrap(), r#""subscription_cancelled""#);
    }

    #[test]
    fn test_unknown_variant() {
        let status: InvoiceStatus = serde_json::from_str(r#""disputed""#).unwrap();
        assert_eq!(status, InvoiceStatus::Unknown);
        assert_eq!(status.label(), "Unknown");
        assert_eq!(serde_json::to_string(&status).unwrap(), r#""unknown""#);
    }

    #[test]
    fn test_parse_accepts_labels() {
        assert_eq!(RecoveryStatus::parse("In Progress"), RecoveryStatus::InProgress);
        assert_eq!(RecoveryStatus::parse("in_progress"), RecoveryStatus::InProgress);
        assert_eq!(SubscriptionStatus::parse("PAST_DUE"), SubscriptionStatus::PastDue);
        assert_eq!(LogLevel::parse("fatal"), LogLevel::Unknown);
    }

    #[test]
    fn test_wire_lists_exclude_unknown() {
        assert_eq!(TenantStatus::WIRE.len(), 7);
        assert!(!InvoiceStatus::WIRE.contains(&"unknown"));
        assert_eq!(LogLevel::ALL.len(), LogLevel::WIRE.len());
    }
}
