use crate::buckets::{AttendanceBuckets, AttendanceCounts, PollTally, Voter};
use crate::models::{Attendance, AttendanceStatus, Event, EventType, Poll, Profile, Tab};
use maud::{html, Markup, PreEscaped, DOCTYPE};

pub struct EventCard<'a> {
    pub event: &'a Event,
    pub counts: AttendanceCounts,
    pub mine: Option<&'a Attendance>,
}

pub struct PollCard<'a> {
    pub poll: &'a Poll,
    pub tally: PollTally,
    pub my_vote: Option<usize>,
}

pub struct HomePage<'a> {
    pub app_name: &'a str,
    pub viewer: &'a Profile,
    pub tab: Tab,
    pub events: Vec<EventCard<'a>>,
    pub polls: Vec<PollCard<'a>>,
    pub team: Vec<&'a Profile>,
}

pub struct EventPage<'a> {
    pub app_name: &'a str,
    pub viewer: &'a Profile,
    pub event: &'a Event,
    pub buckets: AttendanceBuckets,
    pub mine: Option<&'a Attendance>,
}

pub struct PollPage<'a> {
    pub app_name: &'a str,
    pub viewer: &'a Profile,
    pub card: PollCard<'a>,
}

pub fn render_home(page: &HomePage) -> String {
    let return_to = format!("/?tab={}", page.tab.as_str());
    let body = html! {
        header.top {
            div {
                h1 { (page.app_name) }
                p.subtitle { "Hi " (page.viewer.full_name) }
            }
            form method="post" action="/logout" {
                button.link type="submit" { "Log out" }
            }
        }
        @if page.tab == Tab::Schedule {
            @if page.viewer.is_coach() {
                (create_event_form())
            }
            @if page.events.is_empty() {
                p.empty { "No upcoming events." }
            }
            @for card in &page.events {
                (event_card(card, &return_to))
            }
        } @else if page.tab == Tab::Polls {
            @if page.viewer.is_coach() {
                (create_poll_form())
            }
            @if page.polls.is_empty() {
                p.empty { "No polls yet." }
            }
            @for card in &page.polls {
                (poll_card(card, true, &return_to))
            }
        } @else {
            (team_list(&page.team))
        }
    };
    render_layout(page.app_name, page.app_name, body, Some(page.tab))
}

pub fn render_event(page: &EventPage) -> String {
    let event = page.event;
    let return_to = format!("/events/{}", event.id);
    let body = html! {
        header.top {
            a.back href="/?tab=schedule" { "←" }
            h1.truncate { (event.title) }
            @if page.viewer.is_coach() {
                (delete_form(&format!("/events/{}/delete", event.id)))
            }
        }
        section.card {
            p.meta { (long_date(event)) }
            @if !event.location.is_empty() {
                p.location { "📍 " (event.location) }
            }
            (type_badge(event.event_type))
            p.label { "Update status" }
            (attendance_toggle(event, page.mine, true, &return_to))
        }
        div.buckets {
            (voter_list("Present", "present", &page.buckets.present))
            (voter_list("Absent", "absent", &page.buckets.absent))
            (voter_list("Maybe", "maybe", &page.buckets.maybe))
            (voter_list("No Response", "none", &page.buckets.no_response))
        }
    };
    render_layout(page.app_name, &event.title, body, None)
}

pub fn render_poll(page: &PollPage) -> String {
    let card = &page.card;
    let return_to = format!("/polls/{}", card.poll.id);
    let body = html! {
        header.top {
            a.back href="/?tab=polls" { "←" }
            h1 { "Poll Details" }
            @if page.viewer.is_coach() {
                (delete_form(&format!("/polls/{}/delete", card.poll.id)))
            }
        }
        (poll_card(card, false, &return_to))
        section.card.breakdown {
            h3 { "Breakdown" }
            @for option in &card.tally.options {
                div.row {
                    div.row-head {
                        span.strong { (option.label) }
                        span.count { (option.count) }
                    }
                    div.chips {
                        @for voter in &option.voters {
                            span.chip { (voter.full_name) }
                        }
                    }
                }
            }
            div.row.missing {
                div.row-head {
                    span.strong { "No Response" }
                    span.count { (card.tally.no_response.len()) }
                }
                div.chips {
                    @for voter in &card.tally.no_response {
                        span.chip { (voter.full_name) }
                    }
                }
            }
        }
    };
    render_layout(page.app_name, &card.poll.question, body, None)
}

pub fn render_login(app_name: &str, message: Option<&str>) -> String {
    let body = html! {
        section.card.login {
            h1 { (app_name) " Login" }
            form method="post" action="/login" {
                label {
                    "Full Name (for sign up)"
                    input type="text" name="full_name" placeholder="e.g. Ellen Hoog";
                }
                label {
                    "Email"
                    input type="email" name="email" required placeholder="you@example.com";
                }
                label {
                    "Password"
                    input type="password" name="password" required;
                }
                @if let Some(message) = message {
                    p.status data-type="error" { (message) }
                }
                div.actions {
                    button.primary type="submit" name="action" value="signin" { "Log In" }
                    button.secondary type="submit" name="action" value="signup" { "Sign Up" }
                }
            }
        }
    };
    render_layout(app_name, "Login", body, None)
}

fn render_layout(app_name: &str, title: &str, body: Markup, nav: Option<Tab>) -> String {
    html! {
        (DOCTYPE)
        html lang="en" {
            head {
                meta charset="UTF-8";
                meta name="viewport" content="width=device-width, initial-scale=1.0";
                meta name="application-name" content=(app_name);
                title { (title) }
                link rel="manifest" href="/manifest.webmanifest";
                style { (PreEscaped(STYLE)) }
            }
            body {
                main.app { (body) }
                @if let Some(tab) = nav {
                    (bottom_nav(tab))
                }
                script { (PreEscaped(SCRIPT)) }
            }
        }
    }
    .into_string()
}

const NAV_TABS: [(Tab, &str); 3] = [
    (Tab::Schedule, "Schedule"),
    (Tab::Polls, "Polls"),
    (Tab::Team, "Team"),
];

fn bottom_nav(active: Tab) -> Markup {
    html! {
        nav.bottom-nav {
            @for (tab, label) in NAV_TABS {
                a href=(format!("/?tab={}", tab.as_str()))
                    class=(if tab == active { "nav-item active" } else { "nav-item" }) {
                    (label)
                }
            }
        }
    }
}

fn event_card(card: &EventCard, return_to: &str) -> Markup {
    let event = card.event;
    html! {
        article.card {
            a.card-link href=(format!("/events/{}", event.id)) {
                div.row-head {
                    h2 { (event.title) }
                    (type_badge(event.event_type))
                }
                p.meta { (short_date(event)) }
                @if !event.location.is_empty() {
                    p.location { "📍 " (event.location) }
                }
                p.counts {
                    span class="in" { "👍 " (card.counts.present) }
                    span.maybe { "🤔 " (card.counts.maybe) }
                    span.out { "👎 " (card.counts.absent) }
                }
            }
            (attendance_toggle(event, card.mine, false, return_to))
        }
    }
}

fn attendance_toggle(
    event: &Event,
    mine: Option<&Attendance>,
    with_reason: bool,
    return_to: &str,
) -> Markup {
    let current = mine.and_then(|row| row.status);
    let current_reason = mine.and_then(|row| row.reason.as_deref()).unwrap_or_default();
    let choices = [
        (AttendanceStatus::In, "👍 In"),
        (AttendanceStatus::Maybe, "🤔 Maybe"),
        (AttendanceStatus::Out, "👎 Out"),
    ];
    html! {
        form.toggle method="post" action=(format!("/events/{}/attendance", event.id))
            data-event=(event.id.to_string())
            data-status=(current.map(AttendanceStatus::as_str).unwrap_or("none"))
            data-req-out=(event.reason_required_out.to_string())
            data-req-maybe=(event.reason_required_maybe.to_string()) {
            input type="hidden" name="return_to" value=(return_to);
            @if with_reason {
                input.reason type="text" name="reason" value=(current_reason)
                    placeholder=(reason_placeholder(event));
            }
            div.segmented {
                @for (status, label) in choices {
                    @let selected = if current == Some(status) { " selected" } else { "" };
                    button type="submit" name="status" value=(status.as_str())
                        class=(format!("opt {}{selected}", status.as_str())) {
                        (label)
                    }
                }
            }
            p.status {}
        }
    }
}

fn poll_card(card: &PollCard, link_title: bool, return_to: &str) -> Markup {
    let poll = card.poll;
    html! {
        article.card {
            @if link_title {
                a.card-link href=(format!("/polls/{}", poll.id)) { h3 { (poll.question) } }
            } @else {
                h3 { (poll.question) }
            }
            form.poll-vote method="post" action=(format!("/polls/{}/vote", poll.id))
                data-poll=(poll.id.to_string()) {
                input type="hidden" name="return_to" value=(return_to);
                @for option in &card.tally.options {
                    @let selected = card.my_vote == Some(option.index);
                    button type="submit" name="option_index" value=(option.index)
                        class=(if selected { "option selected" } else { "option" }) {
                        span.bar style=(format!("width: {}%", option.percent)) {}
                        span.option-label { (option.label) }
                        span.percent { (option.percent) "%" }
                    }
                }
                p.status {}
            }
            p.total { (card.tally.total_votes) " votes" }
        }
    }
}

fn voter_list(title: &str, tone: &str, voters: &[Voter]) -> Markup {
    html! {
        section class=(format!("bucket {tone}")) {
            h3 { (title) " (" (voters.len()) ")" }
            @if voters.is_empty() {
                p.empty { "Nobody yet." }
            }
            @for voter in voters {
                div.person {
                    span.avatar { (initial(&voter.full_name)) }
                    span { (voter.full_name) }
                }
                @if let Some(reason) = &voter.reason {
                    p.reason-text { "\"" (reason) "\"" }
                }
            }
        }
    }
}

fn team_list(team: &[&Profile]) -> Markup {
    let coaches: Vec<&&Profile> = team.iter().filter(|profile| profile.is_coach()).collect();
    let members: Vec<&&Profile> = team.iter().filter(|profile| !profile.is_coach()).collect();
    html! {
        @for (title, people) in [("Coaches", &coaches), ("Players", &members)] {
            section.card {
                h3 { (title) " (" (people.len()) ")" }
                @if people.is_empty() {
                    p.empty { "Nobody yet." }
                }
                @for profile in people.iter() {
                    div.person {
                        span.avatar { (initial(&profile.full_name)) }
                        span { (profile.full_name) }
                    }
                }
            }
        }
    }
}

fn create_event_form() -> Markup {
    html! {
        details.create {
            summary { "+ New Event" }
            form method="post" action="/events" {
                input type="text" name="title" required placeholder="Event name";
                div.pair {
                    select name="event_type" {
                        option value="training" { "Training" }
                        option value="game" { "Game" }
                        option value="social" { "Social" }
                    }
                    input type="text" name="location" placeholder="Location";
                }
                label {
                    "Start date & time"
                    input type="datetime-local" name="date" required;
                }
                fieldset {
                    label.check {
                        input #repeat-weekly type="checkbox" name="repeat_weekly";
                        "Repeat weekly?"
                    }
                    div #repeat-until hidden {
                        label {
                            "Repeat until"
                            input type="date" name="repeat_until";
                        }
                        p.hint { "Creates an event every 7 days until this date." }
                    }
                }
                fieldset {
                    p.label { "Reason requirements" }
                    label.check {
                        input type="checkbox" name="req_out";
                        "Require reason for 'Out'"
                    }
                    label.check {
                        input type="checkbox" name="req_maybe";
                        "Require reason for 'Maybe'"
                    }
                }
                button.primary type="submit" { "Create" }
            }
        }
    }
}

fn create_poll_form() -> Markup {
    html! {
        details.create {
            summary { "+ New Poll" }
            form #poll-form method="post" action="/polls" {
                input type="text" name="question" required placeholder="Question";
                div #poll-options {
                    input type="text" name="option" required placeholder="Option 1";
                    input type="text" name="option" required placeholder="Option 2";
                }
                button.link #add-option type="button" { "+ Add another option" }
                button.primary type="submit" { "Post Poll" }
            }
        }
    }
}

fn delete_form(action: &str) -> Markup {
    html! {
        form.delete method="post" action=(action) {
            button.danger type="submit" { "🗑️ Delete" }
        }
    }
}

fn type_badge(event_type: EventType) -> Markup {
    html! {
        span class=(format!("badge {}", event_type.as_str())) { (type_label(event_type)) }
    }
}

fn initial(name: &str) -> String {
    name.chars()
        .next()
        .map(|c| c.to_uppercase().collect())
        .unwrap_or_default()
}

fn reason_placeholder(event: &Event) -> &'static str {
    match (event.reason_required_out, event.reason_required_maybe) {
        (true, true) => "Reason (required for out / maybe)",
        (true, false) => "Reason (required for out)",
        (false, true) => "Reason (required for maybe)",
        (false, false) => "Reason (optional)",
    }
}

fn type_label(event_type: EventType) -> &'static str {
    match event_type {
        EventType::Training => "Training",
        EventType::Game => "Game",
        EventType::Social => "Social",
    }
}

fn short_date(event: &Event) -> String {
    event.start_time.format("%a %-d %b · %H:%M").to_string()
}

fn long_date(event: &Event) -> String {
    event.start_time.format("%A %-d %B · %H:%M").to_string()
}

const STYLE: &str = r#"
    :root {
      --bg: #f4f5f7;
      --ink: #1f2328;
      --muted: #6b7280;
      --accent: #2563eb;
      --in: #22c55e;
      --maybe: #fb923c;
      --out: #ef4444;
      --card: #ffffff;
      --line: #e5e7eb;
    }

    * {
      box-sizing: border-box;
    }

    body {
      margin: 0;
      background: var(--bg);
      color: var(--ink);
      font-family: system-ui, -apple-system, "Segoe UI", sans-serif;
    }

    .app {
      width: min(480px, 100%);
      margin: 0 auto;
      padding: 20px 16px 110px;
      display: grid;
      gap: 16px;
    }

    .top {
      display: flex;
      align-items: center;
      justify-content: space-between;
      gap: 12px;
    }

    h1 {
      margin: 0;
      font-size: 1.5rem;
    }

    .truncate {
      flex: 1;
      white-space: nowrap;
      overflow: hidden;
      text-overflow: ellipsis;
    }

    .subtitle, .meta, .hint, .total {
      margin: 0;
      color: var(--muted);
      font-size: 0.9rem;
    }

    .card {
      background: var(--card);
      border: 1px solid var(--line);
      border-radius: 16px;
      padding: 16px;
      display: grid;
      gap: 8px;
    }

    .card-link {
      color: inherit;
      text-decoration: none;
      display: grid;
      gap: 6px;
    }

    .card h2, .card h3 {
      margin: 0;
      font-size: 1.05rem;
    }

    .row-head {
      display: flex;
      justify-content: space-between;
      align-items: center;
      gap: 8px;
    }

    .badge {
      font-size: 0.75rem;
      padding: 2px 8px;
      border-radius: 999px;
      background: #dbeafe;
      color: #1e40af;
      justify-self: start;
    }

    .badge.game { background: #fee2e2; color: #991b1b; }
    .badge.social { background: #fef3c7; color: #92400e; }

    .counts {
      display: flex;
      gap: 12px;
      margin: 0;
      font-size: 0.85rem;
      color: var(--muted);
    }

    .segmented {
      display: flex;
      border: 1px solid var(--line);
      border-radius: 10px;
      overflow: hidden;
    }

    button {
      font: inherit;
      cursor: pointer;
    }

    .opt {
      flex: 1;
      padding: 8px 0;
      border: none;
      border-right: 1px solid var(--line);
      background: white;
      color: var(--muted);
      font-weight: 600;
    }

    .opt:last-child { border-right: none; }
    .opt.in.selected { background: var(--in); color: white; }
    .opt.maybe.selected { background: var(--maybe); color: white; }
    .opt.out.selected { background: var(--out); color: white; }

    input, select {
      font: inherit;
      width: 100%;
      padding: 8px;
      border: 1px solid var(--line);
      border-radius: 8px;
      background: white;
    }

    form {
      display: grid;
      gap: 8px;
    }

    fieldset {
      border: 1px solid var(--line);
      border-radius: 10px;
      padding: 10px;
      display: grid;
      gap: 6px;
    }

    label {
      display: grid;
      gap: 4px;
      font-size: 0.85rem;
      color: var(--muted);
    }

    label.check {
      display: flex;
      align-items: center;
      gap: 8px;
      color: var(--ink);
    }

    label.check input { width: auto; }

    .pair {
      display: flex;
      gap: 8px;
    }

    .label {
      margin: 4px 0 0;
      font-size: 0.75rem;
      font-weight: 700;
      text-transform: uppercase;
      color: var(--muted);
    }

    .primary, .secondary, .danger, summary {
      border-radius: 10px;
      padding: 10px 14px;
      font-weight: 600;
    }

    .primary { background: var(--accent); color: white; border: none; }
    .secondary { background: white; border: 1px solid var(--line); }
    .danger {
      background: #fef2f2;
      color: var(--out);
      border: 1px solid #fecaca;
      padding: 6px 10px;
    }

    .link {
      background: none;
      border: none;
      color: var(--accent);
      padding: 0;
      justify-self: start;
    }

    .back {
      text-decoration: none;
      color: var(--ink);
      font-size: 1.3rem;
    }

    details.create summary {
      list-style: none;
      background: #111827;
      color: white;
      text-align: center;
      cursor: pointer;
    }

    details.create[open] {
      background: var(--card);
      border: 1px solid var(--line);
      border-radius: 16px;
      padding: 12px;
    }

    details.create[open] summary { margin-bottom: 12px; }

    .option {
      position: relative;
      overflow: hidden;
      width: 100%;
      display: flex;
      justify-content: space-between;
      padding: 10px 12px;
      border: 1px solid var(--line);
      border-radius: 10px;
      background: white;
      text-align: left;
    }

    .option.selected { border-color: var(--accent); background: #eff6ff; }

    .bar {
      position: absolute;
      inset: 0 auto 0 0;
      background: #bfdbfe;
      opacity: 0.5;
    }

    .option-label, .percent { position: relative; }
    .percent { font-size: 0.8rem; color: var(--muted); }

    .buckets {
      display: grid;
      grid-template-columns: 1fr 1fr;
      gap: 12px;
    }

    .bucket h3 {
      margin: 0 0 6px;
      font-size: 0.8rem;
      text-transform: uppercase;
      letter-spacing: 0.05em;
    }

    .bucket.present h3 { color: #16a34a; }
    .bucket.absent h3 { color: #dc2626; }
    .bucket.maybe h3 { color: #ea580c; }
    .bucket.none h3 { color: var(--muted); }

    .person {
      display: flex;
      align-items: center;
      gap: 8px;
      padding: 6px 0;
      font-size: 0.9rem;
    }

    .avatar {
      width: 28px;
      height: 28px;
      border-radius: 50%;
      background: var(--line);
      display: inline-grid;
      place-items: center;
      font-size: 0.75rem;
      font-weight: 700;
    }

    .reason-text {
      margin: 0 0 6px 36px;
      font-size: 0.8rem;
      font-style: italic;
      color: var(--muted);
    }

    .breakdown .row { padding: 8px 0; border-top: 1px solid var(--line); }
    .breakdown .missing .strong { color: #7f1d1d; }
    .count {
      font-size: 0.75rem;
      font-weight: 700;
      background: var(--bg);
      padding: 2px 8px;
      border-radius: 6px;
    }
    .chips { display: flex; flex-wrap: wrap; gap: 6px; margin-top: 6px; }
    .chip {
      font-size: 0.75rem;
      border: 1px solid var(--line);
      border-radius: 999px;
      padding: 2px 8px;
    }
    .strong { font-weight: 600; }

    .empty {
      color: var(--muted);
      font-style: italic;
      font-size: 0.9rem;
    }

    .status {
      margin: 0;
      min-height: 1em;
      font-size: 0.85rem;
    }

    .status[data-type="error"] { color: #c63b2b; }

    .login { margin-top: 10vh; }

    .actions {
      display: flex;
      gap: 8px;
    }

    .actions button { flex: 1; }

    .bottom-nav {
      position: fixed;
      left: 0;
      right: 0;
      bottom: 0;
      height: 64px;
      background: white;
      border-top: 1px solid var(--line);
      display: flex;
      justify-content: space-around;
      align-items: center;
    }

    .nav-item {
      color: var(--muted);
      text-decoration: none;
      font-size: 0.8rem;
      font-weight: 600;
    }

    .nav-item.active { color: var(--accent); }
"#;

const SCRIPT: &str = r#"
    const showError = (form, message) => {
      const statusEl = form.querySelector('.status');
      if (statusEl) {
        statusEl.textContent = message;
        statusEl.dataset.type = 'error';
      }
    };

    const markStatus = (form, status) => {
      form.dataset.status = status;
      form.querySelectorAll('button[name="status"]').forEach((button) => {
        button.classList.toggle('selected', button.value === status);
      });
    };

    document.querySelectorAll('form.toggle').forEach((form) => {
      let busy = false;
      form.addEventListener('submit', async (event) => {
        event.preventDefault();
        const button = event.submitter;
        if (!button || busy) {
          return;
        }
        const next = button.value;
        const previous = form.dataset.status || 'none';
        const reasonInput = form.querySelector('input[name="reason"]');
        let reason = reasonInput ? reasonInput.value.trim() : '';
        if (next === previous && !reasonInput) {
          return;
        }
        const needsReason =
          (next === 'out' && form.dataset.reqOut === 'true') ||
          (next === 'maybe' && form.dataset.reqMaybe === 'true');
        if (needsReason && !reason) {
          reason = (window.prompt('Please give a reason') || '').trim();
          if (!reason) {
            return;
          }
        }

        busy = true;
        markStatus(form, next);
        try {
          const res = await fetch('/api/attendance', {
            method: 'POST',
            headers: { 'content-type': 'application/json' },
            body: JSON.stringify({
              event_id: form.dataset.event,
              status: next === 'none' ? null : next,
              reason: reason || null
            })
          });
          if (!res.ok) {
            const msg = await res.text();
            throw new Error(msg || 'Request failed');
          }
          window.location.reload();
        } catch (err) {
          markStatus(form, previous);
          showError(form, err.message);
        } finally {
          busy = false;
        }
      });
    });

    document.querySelectorAll('form.poll-vote').forEach((form) => {
      form.addEventListener('submit', async (event) => {
        event.preventDefault();
        const button = event.submitter;
        if (!button) {
          return;
        }
        const buttons = form.querySelectorAll('button');
        buttons.forEach((b) => { b.disabled = true; });
        try {
          const res = await fetch(`/api/polls/${form.dataset.poll}/vote`, {
            method: 'POST',
            headers: { 'content-type': 'application/json' },
            body: JSON.stringify({ option_index: Number(button.value) })
          });
          if (!res.ok) {
            const msg = await res.text();
            throw new Error(msg || 'Request failed');
          }
          window.location.reload();
        } catch (err) {
          showError(form, err.message);
          buttons.forEach((b) => { b.disabled = false; });
        }
      });
    });

    document.querySelectorAll('form.delete').forEach((form) => {
      form.addEventListener('submit', (event) => {
        if (!window.confirm('Are you sure you want to delete this? This cannot be undone.')) {
          event.preventDefault();
        }
      });
    });

    const repeatWeekly = document.getElementById('repeat-weekly');
    const repeatUntil = document.getElementById('repeat-until');
    if (repeatWeekly && repeatUntil) {
      repeatWeekly.addEventListener('change', () => {
        repeatUntil.hidden = !repeatWeekly.checked;
        repeatUntil.querySelector('input').required = repeatWeekly.checked;
      });
    }

    const addOption = document.getElementById('add-option');
    const pollOptions = document.getElementById('poll-options');
    if (addOption && pollOptions) {
      addOption.addEventListener('click', () => {
        const input = document.createElement('input');
        input.type = 'text';
        input.name = 'option';
        input.placeholder = `Option ${pollOptions.children.length + 1}`;
        pollOptions.appendChild(input);
      });
    }
"#;
