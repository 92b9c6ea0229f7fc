use crate::{
    poller::Alert,
    subscription::{PollKind, Subscription, SubscriptionKey},
};

pub const START_TEXT: &str = "Hi! This bot lets you subscribe to bus stops in Taiwan and get a \
                              message when your bus is near. Send /help to see how to subscribe.";

pub const HELP_EXAMPLE: &str = "Example: /subscribe Taipei 672 1 博仁醫院\nDirection is 0 for \
                                the going route, 1 for the return route.";

pub const NO_SUBSCRIPTION_TEXT: &str = "You have no active subscription.";

/// Confirmation sent after a successful subscribe command.
pub fn format_subscribed(subscription: &Subscription) -> String {
    let marker = match subscription.key.kind {
        PollKind::Arrival => "",
        PollKind::Proximity => " (C)",
    };
    let target = subscription.target();
    format!(
        "Subscribed{marker} to {} going for {} on station {}",
        target.route,
        subscription.terminus_or_unknown(),
        target.station
    )
}

/// Notification text for a tick that found a bus.
pub fn format_alert(subscription: &Subscription, alert: Alert) -> String {
    let target = subscription.target();
    let prefix = format!(
        "Bus {}->{} is coming to {}",
        target.route,
        subscription.terminus_or_unknown(),
        target.station
    );

    match alert {
        Alert::ArrivingNow => format!("{prefix} now!"),
        Alert::ArrivingIn { minutes } => format!("{prefix} in {minutes} minutes!"),
        Alert::StopsAway { stops } => format!("{prefix} by {stops} station(s)!"),
    }
}

pub fn format_subscription_list(keys: &[SubscriptionKey]) -> String {
    if keys.is_empty() {
        return NO_SUBSCRIPTION_TEXT.to_string();
    }

    let lines = keys.iter().map(|key| format!("- {key}")).collect::<Vec<_>>().join("\n");
    format!("Your active subscriptions:\n{lines}")
}
