//! Built-in patterns installed into an empty store.

use popguard_protocols::{DismissAction, InterruptionType, Pattern};

const CLOSE_SELECTORS: &[&str] = &[
    r#"button[aria-label="Close"]"#,
    r#"button[title="Close"]"#,
    ".modal-close",
    ".popup-close",
    ".close-button",
    ".btn-close",
    ".modal .close",
    "button.close",
    ".dialog-close",
    r##"a[href="#close"]"##,
    r#"[data-dismiss="modal"]"#,
    ".modal-header .close",
    ".popover-close",
];

const COOKIE_ACCEPT_SELECTORS: &[&str] = &[
    ".accept-cookies",
    ".cookie-accept",
    "#accept-cookies",
    r#"button[data-action="accept-cookies"]"#,
    "#onetrust-accept-btn-handler",
];

const COOKIE_NOTICE_CLOSE_SELECTORS: &[&str] = &[
    "#cookie-notice .close",
    ".cookie-banner .close",
    ".cookie-consent .close",
    "#cookieConsent .close",
    ".cookie-notification .close",
];

/// Patterns that cover the most common interruptions on any site.
///
/// All of them are global. `popup_escape` ships disabled because pressing
/// Escape on an arbitrary dialog can cancel user-visible work.
pub fn builtin_patterns() -> Vec<Pattern> {
    vec![
        Pattern::new("cookie_accept_common", InterruptionType::Cookie)
            .with_selectors(COOKIE_ACCEPT_SELECTORS.iter().copied())
            .with_action(DismissAction::click())
            .with_keywords(["cookie", "accept", "consent"])
            .with_priority(10)
            .with_description("Accept common cookie banners"),
        Pattern::new("gdpr_consent_accept", InterruptionType::Gdpr)
            .with_selectors([
                "#didomi-notice-agree-button",
                ".fc-cta-consent",
                r#"button[mode="primary"][title="Accept"]"#,
                ".qc-cmp2-summary-buttons button[mode=\"primary\"]",
            ])
            .with_action(DismissAction::click())
            .with_keywords(["gdpr", "consent", "privacy"])
            .with_priority(9)
            .with_description("Accept GDPR consent managers"),
        Pattern::new("cookie_notice_close", InterruptionType::Cookie)
            .with_selectors(COOKIE_NOTICE_CLOSE_SELECTORS.iter().copied())
            .with_action(DismissAction::click())
            .with_keywords(["cookie", "notice"])
            .with_priority(5)
            .with_description("Close cookie notices that have no accept button"),
        Pattern::new("popup_close_common", InterruptionType::Popup)
            .with_selectors(CLOSE_SELECTORS.iter().copied())
            .with_action(DismissAction::click())
            .with_keywords(["close", "modal", "popup"])
            .with_priority(3)
            .with_description("Close generic modal dialogs"),
        Pattern::new("newsletter_dismiss", InterruptionType::Newsletter)
            .with_selectors([
                ".newsletter-popup .close",
                ".newsletter-modal .close",
                r#"[data-testid="newsletter-close"]"#,
            ])
            .with_action(DismissAction::click())
            .with_keywords(["newsletter", "subscribe"])
            .with_priority(2)
            .with_description("Dismiss newsletter signup overlays"),
        Pattern::new("notification_prompt_deny", InterruptionType::Notification)
            .with_selectors([
                "#onesignal-slidedown-cancel-button",
                ".push-notification-deny",
                r#"button[data-action="deny-notifications"]"#,
            ])
            .with_action(DismissAction::click())
            .with_keywords(["notification", "push"])
            .with_priority(2)
            .with_description("Decline in-page push notification prompts"),
        Pattern::new("app_promotion_dismiss", InterruptionType::AppPromotion)
            .with_selectors([
                ".smartbanner-close",
                ".app-banner .close",
                r#"[aria-label="Close app banner"]"#,
            ])
            .with_action(DismissAction::click())
            .with_keywords(["app", "install"])
            .with_priority(1)
            .with_description("Dismiss mobile app install banners"),
        Pattern::new("popup_escape", InterruptionType::Popup)
            .with_selector(r#"[role="dialog"]"#)
            .with_action(DismissAction::Keypress {
                key: "Escape".to_string(),
            })
            .with_enabled(false)
            .with_description("Press Escape on an open dialog"),
    ]
}
