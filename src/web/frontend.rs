//! Embedded HTML/CSS/JS for the oven control panel.
//!
//! The page is compiled into the binary. Element ids are the integration
//! points the API uses: controls post to `/api/controls/{id}`, and each
//! output region is refreshed from `/api/regions` once a second.

/// The complete single-page control panel.
pub const INDEX_HTML: &str = r##"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>oven</title>
<style>
:root {
  --bg: #0d1117;
  --surface: #161b22;
  --border: #30363d;
  --text: #e6edf3;
  --muted: #8b949e;
  --accent: #58a6ff;
  --red: #f85149;
  --blue: #79c0ff;
  --mono: 'SF Mono', 'Cascadia Code', 'Fira Code', monospace;
}
* { margin: 0; padding: 0; box-sizing: border-box; }
body {
  background: var(--bg);
  color: var(--text);
  font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Helvetica, Arial, sans-serif;
  font-size: 14px;
  line-height: 1.5;
}
.app { max-width: 1100px; margin: 0 auto; padding: 24px; }
header { margin-bottom: 20px; padding-bottom: 12px; border-bottom: 1px solid var(--border); }
header h1 { font-size: 22px; font-family: var(--mono); color: var(--accent); }
header .status { color: var(--muted); font-size: 12px; }
.panel {
  background: var(--surface);
  border: 1px solid var(--border);
  border-radius: 8px;
  padding: 16px;
  margin-bottom: 16px;
}
.panel h2 { font-size: 14px; margin-bottom: 10px; }
.controls { display: flex; flex-wrap: wrap; gap: 8px; align-items: center; margin-bottom: 10px; }
button {
  background: #21262d;
  color: var(--text);
  border: 1px solid var(--border);
  border-radius: 6px;
  padding: 5px 12px;
  cursor: pointer;
}
button:hover { border-color: var(--accent); }
input {
  background: var(--bg);
  color: var(--text);
  border: 1px solid var(--border);
  border-radius: 6px;
  padding: 5px 8px;
  font-family: var(--mono);
}
.region {
  font-family: var(--mono);
  font-size: 12px;
  max-height: 420px;
  overflow-y: auto;
  white-space: pre-wrap;
  word-break: break-all;
}
.columns { display: grid; grid-template-columns: 1fr 1fr; gap: 16px; }
.entry { padding: 2px 0; }
.entry.red { color: var(--red); }
.entry.blue { color: var(--blue); }
.entry.notice { color: var(--accent); font-weight: 600; }
.entry.error { color: var(--red); font-weight: 600; }
.entry.error::before { content: "error: "; }
.entry.plain + .entry.plain { border-top: 1px dashed var(--border); margin-top: 6px; padding-top: 6px; }
</style>
</head>
<body>
<div class="app">
  <header>
    <h1>oven</h1>
    <div class="status" id="session-status">idle</div>
  </header>

  <section class="panel">
    <h2>Cluster</h2>
    <div class="controls">
      <button id="bake">Bake a new cluster</button>
      <input id="cid" placeholder="cluster id (j-...)">
      <button id="already-baking-check">Check existing cluster</button>
    </div>
    <div class="region" id="bake-report"></div>
  </section>

  <section class="panel">
    <h2>Data</h2>
    <div class="controls">
      <button id="pull">Pull latest records</button>
    </div>
    <div class="columns">
      <div class="region" id="tweet"></div>
      <div class="region" id="sentiment"></div>
    </div>
  </section>

  <section class="panel">
    <h2>Terminate</h2>
    <div class="controls">
      <button id="terminate">Terminate current cluster</button>
      <input id="terminate-cid" placeholder="cluster id (j-...)">
      <button id="terminate-other">Terminate other cluster</button>
    </div>
    <div class="region" id="terminate-report"></div>
  </section>
</div>

<script>
const INPUTS = { 'already-baking-check': 'cid', 'terminate-other': 'terminate-cid' };

function render(snapshot) {
  for (const [id, html] of Object.entries(snapshot.regions)) {
    const el = document.getElementById(id);
    if (el && el.innerHTML !== html) {
      el.innerHTML = html;
      el.scrollTop = el.scrollHeight;
    }
  }
  const s = snapshot.session;
  const parts = [];
  if (s.cluster_id) parts.push('cluster ' + s.cluster_id);
  if (s.polling) parts.push('polling ' + s.polling);
  if (s.pulling) parts.push('pulling ' + s.pull_count + '/' + s.max_pull_count);
  document.getElementById('session-status').textContent = parts.length ? parts.join(' · ') : 'idle';
}

async function refresh() {
  try {
    const resp = await fetch('/api/regions');
    if (resp.ok) render(await resp.json());
  } catch (_) {
    document.getElementById('session-status').textContent = 'dashboard server unreachable';
  }
}

async function click(id) {
  const input = INPUTS[id];
  const body = input ? { value: document.getElementById(input).value } : {};
  const resp = await fetch('/api/controls/' + id, {
    method: 'POST',
    headers: { 'Content-Type': 'application/json' },
    body: JSON.stringify(body),
  });
  const data = await resp.json();
  if (resp.ok) {
    render(data);
  } else {
    document.getElementById('session-status').textContent = data.error || 'request failed';
  }
}

for (const id of ['bake', 'pull', 'already-baking-check', 'terminate', 'terminate-other']) {
  document.getElementById(id).addEventListener('click', () => click(id));
}

refresh();
setInterval(refresh, 1000);
</script>
</body>
</html>
"##;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::display::Region;
    use crate::ui::Control;

    #[test]
    fn page_carries_every_element_id() {
        let ids = Control::ALL
            .iter()
            .map(|c| c.element_id())
            .chain(Control::ALL.iter().filter_map(|c| c.input_element_id()))
            .chain(Region::ALL.iter().map(|r| r.element_id()));
        for id in ids {
            assert!(
                INDEX_HTML.contains(&format!("id=\"{id}\"")),
                "missing element #{id}"
            );
        }
    }
}
