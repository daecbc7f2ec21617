//! Static registry of vehicle resource endpoints.
//!
//! One table drives both directions of the path protocol: building the
//! request for a named resource, and labeling batch sub-responses by
//! converting their `path` back to the logical name. Keeping both sides on
//! the same entries is what guarantees they cannot drift apart.

use smartcar_core::AliasTable;

/// HTTP verb for a registry entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verb {
    Get,
    Post,
    Delete,
}

/// A vehicle resource endpoint definition.
///
/// `path` is relative to `/vehicles/{id}`; the root resource uses `"/"`.
/// Entries are defined once at startup and shared read-only, so concurrent
/// lookups need no synchronization.
pub struct ResourceSpec {
    pub name: &'static str,
    pub verb: Verb,
    pub path: &'static str,
    pub aliases: &'static AliasTable,
    /// Whether this path may appear inside a batch request.
    pub batch_eligible: bool,
    /// Fixed `{"action": ...}` body for control endpoints.
    pub action: Option<&'static str>,
}

const NO_ALIASES: &AliasTable = &[];

pub static RESOURCES: &[ResourceSpec] = &[
    ResourceSpec {
        name: "attributes",
        verb: Verb::Get,
        path: "/",
        aliases: NO_ALIASES,
        batch_eligible: true,
        action: None,
    },
    ResourceSpec {
        name: "battery",
        verb: Verb::Get,
        path: "/battery",
        aliases: &[("percentRemaining", "percentage_remaining")],
        batch_eligible: true,
        action: None,
    },
    ResourceSpec {
        name: "battery_capacity",
        verb: Verb::Get,
        path: "/battery/capacity",
        aliases: NO_ALIASES,
        batch_eligible: true,
        action: None,
    },
    ResourceSpec {
        name: "charge",
        verb: Verb::Get,
        path: "/charge",
        aliases: &[("isPluggedIn", "is_plugged_in")],
        batch_eligible: true,
        action: None,
    },
    ResourceSpec {
        name: "charge_limit",
        verb: Verb::Get,
        path: "/charge/limit",
        aliases: NO_ALIASES,
        batch_eligible: true,
        action: None,
    },
    ResourceSpec {
        name: "engine_oil",
        verb: Verb::Get,
        path: "/engine/oil",
        aliases: &[("lifeRemaining", "life_remaining")],
        batch_eligible: true,
        action: None,
    },
    ResourceSpec {
        name: "fuel",
        verb: Verb::Get,
        path: "/fuel",
        aliases: &[
            ("amountRemaining", "amount_remaining"),
            ("percentRemaining", "percent_remaining"),
        ],
        batch_eligible: true,
        action: None,
    },
    ResourceSpec {
        name: "location",
        verb: Verb::Get,
        path: "/location",
        aliases: NO_ALIASES,
        batch_eligible: true,
        action: None,
    },
    ResourceSpec {
        name: "odometer",
        verb: Verb::Get,
        path: "/odometer",
        aliases: NO_ALIASES,
        batch_eligible: true,
        action: None,
    },
    ResourceSpec {
        name: "permissions",
        verb: Verb::Get,
        path: "/permissions",
        aliases: NO_ALIASES,
        batch_eligible: false,
        action: None,
    },
    ResourceSpec {
        name: "service_history",
        verb: Verb::Get,
        path: "/service/history",
        aliases: NO_ALIASES,
        batch_eligible: false,
        action: None,
    },
    ResourceSpec {
        name: "tire_pressure",
        verb: Verb::Get,
        path: "/tires/pressure",
        aliases: &[
            ("backLeft", "back_left"),
            ("backRight", "back_right"),
            ("frontLeft", "front_left"),
            ("frontRight", "front_right"),
        ],
        batch_eligible: true,
        action: None,
    },
    ResourceSpec {
        name: "vin",
        verb: Verb::Get,
        path: "/vin",
        aliases: NO_ALIASES,
        batch_eligible: true,
        action: None,
    },
    ResourceSpec {
        name: "lock_status",
        verb: Verb::Get,
        path: "/security",
        aliases: &[("isLocked", "is_locked"), ("chargingPort", "charging_port")],
        batch_eligible: true,
        action: None,
    },
    ResourceSpec {
        name: "diagnostic_system_status",
        verb: Verb::Get,
        path: "/diagnostics/system_status",
        aliases: NO_ALIASES,
        batch_eligible: true,
        action: None,
    },
    ResourceSpec {
        name: "diagnostic_trouble_codes",
        verb: Verb::Get,
        path: "/diagnostics/dtcs",
        aliases: NO_ALIASES,
        batch_eligible: true,
        action: None,
    },
    ResourceSpec {
        name: "lock",
        verb: Verb::Post,
        path: "/security",
        aliases: NO_ALIASES,
        batch_eligible: false,
        action: Some("LOCK"),
    },
    ResourceSpec {
        name: "unlock",
        verb: Verb::Post,
        path: "/security",
        aliases: NO_ALIASES,
        batch_eligible: false,
        action: Some("UNLOCK"),
    },
    ResourceSpec {
        name: "start_charge",
        verb: Verb::Post,
        path: "/charge",
        aliases: NO_ALIASES,
        batch_eligible: false,
        action: Some("START"),
    },
    ResourceSpec {
        name: "stop_charge",
        verb: Verb::Post,
        path: "/charge",
        aliases: NO_ALIASES,
        batch_eligible: false,
        action: Some("STOP"),
    },
    ResourceSpec {
        name: "disconnect",
        verb: Verb::Delete,
        path: "/application",
        aliases: NO_ALIASES,
        batch_eligible: false,
        action: None,
    },
];

/// Look up a resource definition by logical name.
pub fn lookup(name: &str) -> Option<&'static ResourceSpec> {
    RESOURCES.iter().find(|spec| spec.name == name)
}

/// Alias table for a logical name; empty when the resource has none.
pub fn aliases_for(name: &str) -> &'static AliasTable {
    lookup(name).map_or(NO_ALIASES, |spec| spec.aliases)
}

/// Convert a batch sub-response path back to its logical name.
///
/// Most names derive by stripping the leading slash and replacing the
/// remaining slashes with underscores; a handful of paths have names that
/// the generic rule would get wrong and are matched explicitly.
pub fn path_to_name(path: &str) -> String {
    match path {
        "/" => "attributes".to_string(),
        "/tires/pressure" => "tire_pressure".to_string(),
        "/security" => "lock_status".to_string(),
        "/diagnostics/system_status" => "diagnostic_system_status".to_string(),
        "/diagnostics/dtcs" => "diagnostic_trouble_codes".to_string(),
        _ => path.trim_start_matches('/').replace('/', "_"),
    }
}

/// Full request path for a resource path relative to a vehicle.
pub fn vehicle_path(vehicle_id: &str, resource_path: &str) -> String {
    if resource_path == "/" {
        format!("/vehicles/{vehicle_id}")
    } else {
        format!("/vehicles/{vehicle_id}{resource_path}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_finds_registered_resources() {
        let spec = lookup("battery").unwrap();
        assert_eq!(spec.path, "/battery");
        assert_eq!(spec.verb, Verb::Get);
        assert!(lookup("warp_drive").is_none());
    }

    #[test]
    fn batch_eligible_paths_round_trip_through_name_mapping() {
        for spec in RESOURCES.iter().filter(|spec| spec.batch_eligible) {
            assert_eq!(path_to_name(spec.path), spec.name, "path {}", spec.path);
        }
    }

    #[test]
    fn special_case_paths_do_not_use_the_generic_rule() {
        assert_eq!(path_to_name("/"), "attributes");
        assert_eq!(path_to_name("/tires/pressure"), "tire_pressure");
        assert_eq!(path_to_name("/security"), "lock_status");
        assert_eq!(path_to_name("/diagnostics/system_status"), "diagnostic_system_status");
        assert_eq!(path_to_name("/diagnostics/dtcs"), "diagnostic_trouble_codes");
    }

    #[test]
    fn generic_rule_converts_slashes() {
        assert_eq!(path_to_name("/battery/capacity"), "battery_capacity");
        assert_eq!(path_to_name("/charge/limit"), "charge_limit");
        assert_eq!(path_to_name("/odometer"), "odometer");
    }

    #[test]
    fn vehicle_path_handles_the_root_resource() {
        assert_eq!(vehicle_path("veh_1", "/"), "/vehicles/veh_1");
        assert_eq!(vehicle_path("veh_1", "/battery"), "/vehicles/veh_1/battery");
    }

    #[test]
    fn control_endpoints_carry_fixed_actions() {
        assert_eq!(lookup("lock").unwrap().action, Some("LOCK"));
        assert_eq!(lookup("unlock").unwrap().action, Some("UNLOCK"));
        assert_eq!(lookup("start_charge").unwrap().action, Some("START"));
        assert_eq!(lookup("stop_charge").unwrap().action, Some("STOP"));
    }
}
