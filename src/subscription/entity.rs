use std::{fmt, str::FromStr};

use teloxide::types::ChatId;

use crate::transit::Direction;

/// Shown in place of a terminus that could not be resolved.
const UNKNOWN_TERMINUS: &str = "?";

/// A stop on a route, as given in a subscribe command.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StopTarget {
    /// City code used in API paths, e.g. `Taipei`.
    pub city: String,
    /// Route name, e.g. `672`.
    pub route: String,
    /// Direction of travel.
    pub direction: Direction,
    /// Station display name, matched exactly.
    pub station: String,
}

impl fmt::Display for StopTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} ({}) @ {}", self.city, self.route, self.direction, self.station)
    }
}

impl FromStr for StopTarget {
    type Err = String;

    /// Parses `<city> <route> <direction> <station>`. Everything after the
    /// direction is the station name, so names with spaces survive.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.split_whitespace();
        let (Some(city), Some(route), Some(direction)) = (parts.next(), parts.next(), parts.next())
        else {
            return Err("Expected <city> <route> <direction> <station>".to_string());
        };
        let station = parts.collect::<Vec<_>>().join(" ");
        if station.is_empty() {
            return Err("Station cannot be empty".to_string());
        }

        Ok(Self {
            city: city.to_string(),
            route: route.to_string(),
            direction: direction.parse()?,
            station,
        })
    }
}

/// How a subscription decides that a bus is near.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PollKind {
    /// Estimated arrival time at the stop.
    Arrival,
    /// Number of stops between the nearest bus and the stop.
    Proximity,
}

/// Identity of a live subscription.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SubscriptionKey {
    /// Chat that owns the subscription.
    pub chat_id: ChatId,
    /// What the subscription alerts on.
    pub kind: PollKind,
    /// The stop being watched.
    pub target: StopTarget,
}

impl SubscriptionKey {
    /// Creates a new `SubscriptionKey`.
    pub fn new(chat_id: ChatId, kind: PollKind, target: StopTarget) -> Self {
        Self { chat_id, kind, target }
    }
}

impl fmt::Display for SubscriptionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self.kind {
            PollKind::Arrival => "time",
            PollKind::Proximity => "stops",
        };
        write!(f, "[{kind}] {}", self.target)
    }
}

/// A registered subscription: its key plus data resolved once at creation.
#[derive(Debug, Clone, PartialEq)]
pub struct Subscription {
    /// Identity of the subscription.
    pub key: SubscriptionKey,
    /// Last stop of the route in the subscribed direction. Never re-queried.
    pub terminus: Option<String>,
}

impl Subscription {
    /// Chat to notify.
    pub fn chat_id(&self) -> ChatId {
        self.key.chat_id
    }

    /// The stop being watched.
    pub fn target(&self) -> &StopTarget {
        &self.key.target
    }

    /// Terminus name, or `?` when it could not be resolved.
    pub fn terminus_or_unknown(&self) -> &str {
        self.terminus.as_deref().unwrap_or(UNKNOWN_TERMINUS)
    }
}

/// Which tasks an unsubscribe request cancels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UnsubscribeScope {
    /// Only the caller's subscriptions.
    #[default]
    Chat,
    /// Every subscription in the process.
    Global,
}

impl FromStr for UnsubscribeScope {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "chat" => Ok(Self::Chat),
            "global" => Ok(Self::Global),
            other => Err(format!("Unknown unsubscribe scope '{other}'")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_stop_target() {
        let target = StopTarget::from_str("Taipei 672 1 博仁醫院").unwrap();

        assert_eq!(target.city, "Taipei");
        assert_eq!(target.route, "672");
        assert_eq!(target.direction, Direction::Return);
        assert_eq!(target.station, "博仁醫院");
    }

    #[test]
    fn test_parse_stop_target_station_with_spaces() {
        let target = StopTarget::from_str("  Taipei 672  0 MRT   Station ").unwrap();

        assert_eq!(target.direction, Direction::Outbound);
        assert_eq!(target.station, "MRT Station");
    }

    #[test]
    fn test_parse_stop_target_missing_arguments() {
        assert!(StopTarget::from_str("").is_err());
        assert!(StopTarget::from_str("Taipei 672").is_err());
        assert!(StopTarget::from_str("Taipei 672 1").is_err());
    }

    #[test]
    fn test_parse_stop_target_invalid_direction() {
        assert!(StopTarget::from_str("Taipei 672 2 博仁醫院").is_err());
        assert!(StopTarget::from_str("Taipei 672 north 博仁醫院").is_err());
    }

    #[test]
    fn test_keys_with_separator_in_values_do_not_collide() {
        let chat_id = ChatId(1);
        let a = SubscriptionKey::new(
            chat_id,
            PollKind::Arrival,
            StopTarget::from_str("Taipei 6-7 1 A").unwrap(),
        );
        let b = SubscriptionKey::new(
            chat_id,
            PollKind::Arrival,
            StopTarget::from_str("Taipei 6 1 7-A").unwrap(),
        );

        assert_ne!(a, b);
    }

    #[test]
    fn test_terminus_or_unknown() {
        let key = SubscriptionKey::new(
            ChatId(1),
            PollKind::Arrival,
            StopTarget::from_str("Taipei 672 1 博仁醫院").unwrap(),
        );
        let resolved = Subscription { key: key.clone(), terminus: Some("大鵬新城".to_string()) };
        let unresolved = Subscription { key, terminus: None };

        assert_eq!(resolved.terminus_or_unknown(), "大鵬新城");
        assert_eq!(unresolved.terminus_or_unknown(), "?");
    }

    #[test]
    fn test_unsubscribe_scope_from_str() {
        assert_eq!("chat".parse::<UnsubscribeScope>(), Ok(UnsubscribeScope::Chat));
        assert_eq!("GLOBAL".parse::<UnsubscribeScope>(), Ok(UnsubscribeScope::Global));
        assert!("all".parse::<UnsubscribeScope>().is_err());
    }
}
