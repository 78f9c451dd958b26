use crate::models::ItemCount;
use url::Url;

pub const PALETTE: [&str; 6] = [
    "linear-gradient(135deg, #FF6B6B, #EE5253)",
    "linear-gradient(135deg, #FECA57, #FF9F43)",
    "linear-gradient(135deg, #1DD1A1, #10AC84)",
    "linear-gradient(135deg, #54A0FF, #2E86DE)",
    "linear-gradient(135deg, #5F27CD, #341F97)",
    "linear-gradient(135deg, #FF9FF3, #F368E0)",
];

pub const DEFAULT_COLOR: &str = PALETTE[0];

/// Fills the page template in a single pass over `INDEX_HTML`, so rendered
/// fragments are never scanned for placeholders again.
pub fn render_index(date: &str, counts: &[ItemCount]) -> String {
    let mut html = String::with_capacity(INDEX_HTML.len() + counts.len() * 512);
    let mut rest = INDEX_HTML;

    while let Some(open) = rest.find("{{") {
        html.push_str(&rest[..open]);
        let tail = &rest[open + 2..];
        let Some(close) = tail.find("}}") else {
            rest = &rest[open..];
            break;
        };

        match &tail[..close] {
            "DATE" => html.push_str(&escape_html(date)),
            "CARDS" => html.push_str(&render_cards(counts)),
            "SWATCHES" => html.push_str(&render_swatches()),
            "STATS" => html.push_str(&render_stats(counts)),
            other => {
                html.push_str("{{");
                html.push_str(other);
                html.push_str("}}");
            }
        }
        rest = &tail[close + 2..];
    }

    html.push_str(rest);
    html
}

/// Form target for tracking `id`, with the id percent-encoded as one path
/// segment.
fn track_action(id: &str) -> String {
    let Ok(mut url) = Url::parse("http://localhost/track") else {
        return "/track".to_string();
    };
    if let Ok(mut segments) = url.path_segments_mut() {
        segments.push(id);
    }
    url.path().to_string()
}

fn render_cards(counts: &[ItemCount]) -> String {
    counts
        .iter()
        .map(|item| {
            format!(
                r#"<form class="card-form" method="post" action="{action}" data-id="{id}">
        <button type="submit" class="habit-card" style="background: {color}">
          <span class="habit-name">{name}</span>
          <span class="habit-count">{count}</span>
        </button>
      </form>
"#,
                action = escape_html(&track_action(&item.id)),
                id = escape_html(&item.id),
                color = escape_html(&item.color),
                name = escape_html(&item.name),
                count = item.count,
            )
        })
        .collect()
}

fn render_swatches() -> String {
    PALETTE
        .iter()
        .enumerate()
        .map(|(index, color)| {
            let checked = if index == 0 { " checked" } else { "" };
            format!(
                r#"<label class="swatch" style="--bg: {color}"><input type="radio" name="color" value="{color}"{checked} /><span></span></label>
"#,
                color = escape_html(color),
            )
        })
        .collect()
}

fn render_stats(counts: &[ItemCount]) -> String {
    if counts.is_empty() {
        return r#"<li class="stats-item empty">No habits yet</li>"#.to_string();
    }
    counts
        .iter()
        .map(|item| {
            format!(
                r#"<li class="stats-item" data-id="{id}"><span>{name}</span><span class="stats-count">{count}</span></li>
"#,
                id = escape_html(&item.id),
                name = escape_html(&item.name),
                count = item.count,
            )
        })
        .collect()
}

pub fn escape_html(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for ch in input.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}

const INDEX_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="UTF-8" />
  <meta name="viewport" content="width=device-width, initial-scale=1.0" />
  <title>Habit Counter</title>
  <style>
    :root {
      --bg-1: #f8f3e6;
      --ink: #2b2a28;
      --accent-2: #2f4858;
      --card: rgba(255, 255, 255, 0.86);
      --shadow: 0 24px 60px rgba(47, 72, 88, 0.18);
    }

    * {
      box-sizing: border-box;
    }

    body {
      margin: 0;
      min-height: 100vh;
      background: linear-gradient(135deg, var(--bg-1), #ffe9d4 60%, #f9f2e9 100%);
      color: var(--ink);
      font-family: "Trebuchet MS", sans-serif;
      display: grid;
      place-items: start center;
      padding: 32px 18px 48px;
    }

    .app {
      width: min(860px, 100%);
      background: var(--card);
      border-radius: 28px;
      box-shadow: var(--shadow);
      padding: 32px;
      display: grid;
      gap: 24px;
    }

    header {
      display: flex;
      align-items: center;
      justify-content: space-between;
      gap: 12px;
    }

    h1 {
      margin: 0;
      font-size: clamp(1.8rem, 4vw, 2.4rem);
    }

    button {
      appearance: none;
      border: none;
      border-radius: 999px;
      padding: 12px 18px;
      font-size: 1rem;
      font-weight: 600;
      cursor: pointer;
      background: var(--accent-2);
      color: white;
    }

    .grid {
      display: grid;
      grid-template-columns: repeat(auto-fill, minmax(160px, 1fr));
      gap: 16px;
    }

    .card-form {
      margin: 0;
    }

    .habit-card {
      position: relative;
      overflow: hidden;
      width: 100%;
      aspect-ratio: 1;
      border-radius: 22px;
      display: grid;
      place-items: center;
      align-content: center;
      gap: 8px;
      color: white;
      transition: transform 150ms ease;
    }

    .habit-card:active {
      transform: scale(0.97);
    }

    .habit-name {
      font-size: 1.1rem;
    }

    .habit-count {
      font-size: 2.6rem;
    }

    .add-card {
      width: 100%;
      aspect-ratio: 1;
      border-radius: 22px;
      border: 2px dashed rgba(47, 72, 88, 0.3);
      background: transparent;
      color: var(--accent-2);
      font-size: 2.4rem;
    }

    .ripple {
      position: absolute;
      border-radius: 50%;
      transform: scale(0);
      background: rgba(255, 255, 255, 0.5);
      animation: ripple 600ms linear;
      pointer-events: none;
    }

    dialog {
      border: none;
      border-radius: 22px;
      padding: 24px;
      width: min(380px, 90vw);
      box-shadow: var(--shadow);
    }

    dialog form {
      display: grid;
      gap: 16px;
    }

    dialog input[type="text"] {
      font-size: 1rem;
      padding: 10px 12px;
      border-radius: 12px;
      border: 1px solid rgba(47, 72, 88, 0.2);
    }

    .swatches {
      display: flex;
      gap: 10px;
      flex-wrap: wrap;
    }

    .swatch input {
      display: none;
    }

    .swatch span {
      display: block;
      width: 34px;
      height: 34px;
      border-radius: 50%;
      background: var(--bg);
      cursor: pointer;
      border: 3px solid transparent;
    }

    .swatch input:checked + span {
      border-color: var(--ink);
    }

    .modal-actions {
      display: flex;
      justify-content: flex-end;
      gap: 8px;
    }

    .secondary {
      background: rgba(47, 72, 88, 0.1);
      color: var(--accent-2);
    }

    .stats-list {
      list-style: none;
      padding: 0;
      margin: 0;
      display: grid;
      gap: 8px;
    }

    .stats-item {
      display: flex;
      justify-content: space-between;
      padding: 10px 12px;
      border-radius: 12px;
      background: rgba(47, 72, 88, 0.06);
    }

    .stats-item.empty {
      justify-content: center;
      opacity: 0.5;
    }

    .status {
      min-height: 1.2em;
      color: #c63b2b;
    }

    @keyframes ripple {
      to {
        transform: scale(4);
        opacity: 0;
      }
    }
  </style>
</head>
<body>
  <main class="app">
    <header>
      <h1>Habit Counter</h1>
      <button type="button" id="stats-btn">Today</button>
    </header>

    <section class="grid" id="grid">
      {{CARDS}}
      <button type="button" class="add-card" id="add-btn" aria-label="Add habit">+</button>
    </section>

    <p class="status" id="status" role="status"></p>
  </main>

  <dialog id="add-modal">
    <form id="add-form" method="post" action="/items">
      <h2>New habit</h2>
      <input type="text" name="name" id="new-item-name" placeholder="Drink water" autocomplete="off" />
      <div class="swatches">
        {{SWATCHES}}
      </div>
      <div class="modal-actions">
        <button type="button" class="secondary" id="cancel-add">Cancel</button>
        <button type="submit">Add</button>
      </div>
    </form>
  </dialog>

  <dialog id="stats-modal">
    <h2 id="current-date">{{DATE}}</h2>
    <ul class="stats-list" id="stats-list">
      {{STATS}}
    </ul>
    <div class="modal-actions">
      <button type="button" class="secondary" id="close-stats">Close</button>
    </div>
  </dialog>

  <script>
    const statusEl = document.getElementById('status');
    const addModal = document.getElementById('add-modal');
    const statsModal = document.getElementById('stats-modal');
    const nameInput = document.getElementById('new-item-name');

    const setStatus = (message) => {
      statusEl.textContent = message;
    };

    const ripple = (card, event) => {
      const rect = card.getBoundingClientRect();
      const size = Math.max(rect.width, rect.height);
      const x = (event.clientX || rect.left + rect.width / 2) - rect.left - size / 2;
      const y = (event.clientY || rect.top + rect.height / 2) - rect.top - size / 2;
      const span = document.createElement('span');
      span.className = 'ripple';
      span.style.width = span.style.height = `${size}px`;
      span.style.left = `${x}px`;
      span.style.top = `${y}px`;
      card.appendChild(span);
      setTimeout(() => span.remove(), 600);
    };

    const track = async (form, event) => {
      const id = form.dataset.id;
      const res = await fetch(`/api/items/${encodeURIComponent(id)}/track`, { method: 'POST' });
      if (!res.ok) {
        throw new Error((await res.text()) || 'Request failed');
      }
      const body = await res.json();
      form.querySelector('.habit-count').textContent = body.count;
      const row = document.querySelector(`.stats-item[data-id="${CSS.escape(id)}"] .stats-count`);
      if (row) {
        row.textContent = body.count;
      }
    };

    document.querySelectorAll('.card-form').forEach((form) => {
      const card = form.querySelector('.habit-card');
      card.addEventListener('click', (event) => ripple(card, event));
      form.addEventListener('submit', (event) => {
        event.preventDefault();
        track(form, event).catch((err) => setStatus(err.message));
      });
    });

    document.getElementById('add-btn').addEventListener('click', () => {
      nameInput.value = '';
      addModal.showModal();
      nameInput.focus();
    });

    document.getElementById('cancel-add').addEventListener('click', () => addModal.close());

    document.getElementById('add-form').addEventListener('submit', async (event) => {
      event.preventDefault();
      const data = new FormData(event.target);
      const name = String(data.get('name') || '').trim();
      if (!name) {
        return;
      }
      const res = await fetch('/api/items', {
        method: 'POST',
        headers: { 'content-type': 'application/json' },
        body: JSON.stringify({ name, color: data.get('color') })
      });
      if (!res.ok) {
        setStatus((await res.text()) || 'Request failed');
        return;
      }
      window.location.reload();
    });

    document.getElementById('stats-btn').addEventListener('click', () => statsModal.showModal());
    document.getElementById('close-stats').addEventListener('click', () => statsModal.close());

    [addModal, statsModal].forEach((modal) => {
      modal.addEventListener('click', (event) => {
        if (event.target === modal) {
          modal.close();
        }
      });
    });
  </script>
</body>
</html>
"#;
