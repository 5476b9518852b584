use super::EmailMessage;

const BRAND_COLOR: &str = "#0d9488";

/// One line of the weekly digest.
#[derive(Debug, Clone)]
pub struct DigestEntry {
    pub title: String,
    pub date: String,
    pub location: String,
}

fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

fn wrap(heading: &str, inner: &str) -> String {
    format!(
        "<div style=\"font-family: Arial, sans-serif; max-width: 600px; margin: 0 auto;\">\
         <h1 style=\"color: {BRAND_COLOR};\">{heading}</h1>{inner}</div>"
    )
}

fn button(href: &str, label: &str) -> String {
    format!(
        "<div style=\"margin-top: 30px; text-align: center;\">\
         <a href=\"{href}\" style=\"background-color: {BRAND_COLOR}; color: white; \
         padding: 10px 20px; text-decoration: none; border-radius: 5px;\">{label}</a></div>"
    )
}

pub fn welcome(to: &str, name: &str, site_url: &str) -> EmailMessage {
    let text = format!(
        "Hi {name},\n\n\
         Welcome to Street Pulse! We're excited to have you join our community of dancers.\n\n\
         With Street Pulse, you can:\n\
         - Discover dance events near you\n\
         - RSVP to events and get reminders\n\
         - Connect with other dancers and organizers\n\n\
         Get started by browsing events or completing your profile.\n\n\
         Happy dancing!\nThe Street Pulse Team\n"
    );

    let html = wrap(
        "Welcome to Street Pulse!",
        &format!(
            "<p>Hi {name},</p>\
             <p>Welcome to Street Pulse! We're excited to have you join our community of dancers.</p>\
             <ul><li>Discover dance events near you</li><li>RSVP to events and get reminders</li>\
             <li>Connect with other dancers and organizers</li></ul>\
             <p>Get started by browsing events or completing your profile.</p>{button}\
             <p style=\"margin-top: 30px;\">Happy dancing!<br>The Street Pulse Team</p>",
            name = escape_html(name),
            button = button(&format!("{site_url}/events"), "Browse Events"),
        ),
    );

    EmailMessage {
        to: to.to_string(),
        subject: "Welcome to Street Pulse!".to_string(),
        html,
        text,
    }
}

pub fn rsvp_confirmation(
    to: &str,
    name: &str,
    event_title: &str,
    event_date: &str,
    event_location: &str,
) -> EmailMessage {
    let text = format!(
        "Hi {name},\n\n\
         Your RSVP for \"{event_title}\" has been confirmed!\n\n\
         Event Details:\n- Date: {event_date}\n- Location: {event_location}\n\n\
         We look forward to seeing you there!\n\nThe Street Pulse Team\n"
    );

    let html = wrap(
        "RSVP Confirmation",
        &format!(
            "<p>Hi {name},</p>\
             <p>Your RSVP for <strong>{title}</strong> has been confirmed!</p>\
             <div style=\"background-color: #f3f4f6; padding: 20px; border-radius: 5px; margin: 20px 0;\">\
             <h2 style=\"margin-top: 0;\">Event Details:</h2>\
             <p><strong>Date:</strong> {date}</p>\
             <p style=\"margin-bottom: 0;\"><strong>Location:</strong> {location}</p></div>\
             <p>We look forward to seeing you there!</p>\
             <p style=\"margin-top: 30px;\">The Street Pulse Team</p>",
            name = escape_html(name),
            title = escape_html(event_title),
            date = escape_html(event_date),
            location = escape_html(event_location),
        ),
    );

    EmailMessage {
        to: to.to_string(),
        subject: format!("RSVP Confirmation: {event_title}"),
        html,
        text,
    }
}

pub fn weekly_digest(to: &str, name: &str, events: &[DigestEntry], site_url: &str) -> EmailMessage {
    let events_text = events
        .iter()
        .map(|e| format!("- {}\n  Date: {}\n  Location: {}", e.title, e.date, e.location))
        .collect::<Vec<_>>()
        .join("\n\n");

    let text = format!(
        "Hi {name},\n\n\
         Here are the upcoming dance events this week that match your interests:\n\n\
         {events_text}\n\n\
         Check out the full calendar on our website.\n\n\
         Happy dancing!\nThe Street Pulse Team\n"
    );

    let events_html: String = events
        .iter()
        .map(|e| {
            format!(
                "<div style=\"margin-bottom: 20px;\"><h3 style=\"margin-bottom: 5px;\">{}</h3>\
                 <p style=\"margin: 0;\"><strong>Date:</strong> {}</p>\
                 <p style=\"margin: 0;\"><strong>Location:</strong> {}</p></div>",
                escape_html(&e.title),
                escape_html(&e.date),
                escape_html(&e.location),
            )
        })
        .collect();

    let html = wrap(
        "Your Weekly Dance Events Digest",
        &format!(
            "<p>Hi {name},</p>\
             <p>Here are the upcoming dance events this week that match your interests:</p>\
             <div style=\"background-color: #f3f4f6; padding: 20px; border-radius: 5px; margin: 20px 0;\">\
             {events_html}</div>{button}\
             <p style=\"margin-top: 30px;\">Happy dancing!<br>The Street Pulse Team</p>",
            name = escape_html(name),
            button = button(&format!("{site_url}/events"), "View All Events"),
        ),
    );

    EmailMessage {
        to: to.to_string(),
        subject: "Your Weekly Dance Events Digest".to_string(),
        html,
        text,
    }
}
