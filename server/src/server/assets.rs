//! Built-in HTML form served at `/`.

use axum::response::Html;

const INDEX_HTML: &str = r#"<!doctype html>
<html lang="en">
<head>
  <meta charset="utf-8" />
  <meta name="viewport" content="width=device-width, initial-scale=1" />
  <title>QR Art</title>
  <style>
    body {
      font-family: system-ui, sans-serif;
      max-width: 36rem;
      margin: 2rem auto;
      padding: 0 1rem;
    }
    label { display: block; margin-top: 0.8rem; font-weight: 600; }
    input, select { width: 100%; padding: 0.4rem; box-sizing: border-box; }
    button { margin-top: 1.2rem; padding: 0.5rem 1.2rem; }
    small { color: #666; }
  </style>
</head>
<body>
  <h1>QR Art</h1>
  <form action="/generate" method="get">
    <label for="data">Data</label>
    <input type="text" id="data" name="data" placeholder="https://..." required />

    <label for="art">Artwork URL</label>
    <input type="text" id="art" name="art" placeholder="https://.../image.png" />

    <label for="dot">Dot size <small>0.55 to 0.92</small></label>
    <input type="text" id="dot" name="dot" value="0.78" />

    <label for="wash">White wash <small>0 to 0.6</small></label>
    <input type="text" id="wash" name="wash" value="0.20" />

    <label for="budget">Suppression budget <small>0 to 0.18</small></label>
    <input type="text" id="budget" name="budget" value="0.08" />

    <label for="ec">Error correction</label>
    <select id="ec" name="ec">
      <option value="H" selected>H</option>
      <option value="Q">Q</option>
      <option value="M">M</option>
      <option value="L">L</option>
    </select>

    <label for="fit">Artwork fit</label>
    <select id="fit" name="fit">
      <option value="contain" selected>contain</option>
      <option value="cover">cover</option>
    </select>

    <label for="light">Light modules</label>
    <select id="light" name="light">
      <option value="dot" selected>white dots</option>
      <option value="omit">show artwork</option>
    </select>

    <button type="submit">Generate</button>
  </form>
</body>
</html>
"#;

/// GET /
pub async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}
