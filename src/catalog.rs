//! Karten-Katalog für die Landing Page
//!
//! Statische Liste der Werbe-Karten. Das Karussell rendert den Katalog
//! zweimal hintereinander, damit der Umbruch am Ende nicht sichtbar ist.

use serde::Serialize;

/// Eine Werbe-Karte
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Card {
    pub title: &'static str,
    pub text: &'static str,
}

/// Alle Karten in Anzeigereihenfolge
pub const CARDS: [Card; 8] = [
    Card {
        title: "💬 Instant Chat",
        text: "Start chatting instantly without any sign-up process. Just enter a nickname and dive.",
    },
    Card {
        title: "👥 Multiple Users",
        text: "Engage in group chats with multiple users in a single room. Perfect for lively discussions.",
    },
    Card {
        title: "🔒 Privacy First",
        text: "Your privacy is our priority. No accounts, no tracking, just secure and anonymous conversations.",
    },
    Card {
        title: "💰 Always Free",
        text: "No hidden fees or subscriptions. Enjoy unlimited chatting without ever worrying about costs.",
    },
    Card {
        title: "🎮 Fun Features",
        text: "Explore exciting features like emojis, GIFs, and custom themes to make your chats more fun and expressive.",
    },
    Card {
        title: "📱 Cross-Platform",
        text: "Chat seamlessly across devices. Whether on your phone, tablet, or desktop, your conversations are always in sync.",
    },
    Card {
        title: "🎉 Event Chats",
        text: "Create or join chat rooms for events, meetups, or special occasions. Perfect for organizing and staying connected.",
    },
    Card {
        title: "📂 File Sharing",
        text: "Share files, images, and documents effortlessly. Collaborate and communicate without switching platforms.",
    },
];

/// Gibt den Katalog zurück
pub fn cards() -> &'static [Card] {
    &CARDS
}

/// Karussell-Spur: der Katalog zweimal hintereinander
pub fn carousel_track() -> Vec<Card> {
    CARDS.iter().chain(CARDS.iter()).copied().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_track_is_catalog_twice() {
        let track = carousel_track();
        assert_eq!(track.len(), cards().len() * 2);
        assert_eq!(&track[..CARDS.len()], &track[CARDS.len()..]);
        assert_eq!(track[0].title, "💬 Instant Chat");
    }
}
