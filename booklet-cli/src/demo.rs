use libbooklet::Settings;

/// Strips the leading `.` of a class selector so it can go in a `class`
/// attribute.
fn class_name(selector: &str) -> &str {
    selector.trim_start_matches('.')
}

fn escape_attr(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('"', "&quot;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

pub fn header(title: &str, settings: &Settings) -> String {
    let w = settings.page.width;
    let h = settings.page.height;
    format!(
        r#"<!DOCTYPE html>
<html>

<head>
<title>{title}</title>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<style type="text/css">
body {{ font-family: sans-serif; }}
h1 {{ text-align: center; }}
.{container} {{ position: relative; width: {book_w}px; height: {h}px; margin: 2em auto; }}
.{left}, .{right} {{ position: absolute; top: 0; width: {w}px; height: {h}px; }}
.{left} {{ left: 0; }}
.{right} {{ right: 0; }}
.{left} img, .{right} img {{ cursor: grab; user-select: none; }}
.{controls} {{ position: absolute; top: {controls_top}px; width: 100%; text-align: center; }}
.{controls} a {{ margin: 0 1em; }}
.{controls} a.{disabled} {{ color: #aaa; pointer-events: none; }}
</style>
</head>

<body>
<h1>{title}</h1>

"#,
        title = escape_attr(title),
        container = class_name(&settings.container),
        left = class_name(&settings.panels.left),
        right = class_name(&settings.panels.right),
        controls = class_name(&settings.controls.container),
        disabled = settings.disabled_button_class,
        book_w = w * 2,
        w = w,
        h = h,
        controls_top = h + 8,
    )
}

fn pane(class: &str, images: &[String]) -> String {
    let mut html = format!("<div class=\"{}\">\n", class_name(class));
    for src in images {
        html += &format!("\t<img src=\"{}\" alt=\"\" />\n", escape_attr(src));
    }
    html + "</div>\n"
}

/// Booklet markup for the given page image URLs.
pub fn booklet(settings: &Settings, left: &[String], right: &[String]) -> String {
    let controls = &settings.controls;
    format!(
        r##"<div class="{container}">
{left}{right}<div class="{controls}">
	<a href="#" class="{prev}">&laquo; prev</a>
	<a href="#" class="{close}">close</a>
	<a href="#" class="{next}">next &raquo;</a>
</div>
</div>
"##,
        container = class_name(&settings.container),
        left = pane(&settings.panels.left, left),
        right = pane(&settings.panels.right, right),
        controls = class_name(&controls.container),
        prev = class_name(&controls.prev),
        close = class_name(&controls.close),
        next = class_name(&controls.next),
    )
}

/// `value` as a JS string literal that cannot end the surrounding
/// `<script>` element.
fn script_string(value: &str) -> String {
    serde_json::to_string(value)
        .unwrap_or_else(|_| "\"\"".to_string())
        .replace("</", "<\\/")
}

/// Module script loading the wasm package from `pkg_dir` and attaching the
/// booklet. Closing hides every booklet container.
pub fn loader(settings: &Settings, options_json: &str, pkg_dir: &str) -> String {
    format!(
        r#"
<script type="module">
import init, {{ createBooklets }} from '{pkg_dir}/booklet_wasm.js';

await init();
window.booklets = createBooklets({options});
document.addEventListener('onBookletClose', () => {{
    document.querySelectorAll({container}).forEach((el) => {{ el.style.display = 'none'; }});
}});
</script>
"#,
        pkg_dir = pkg_dir,
        options = script_string(options_json),
        container = script_string(&settings.container),
    )
}

pub fn footer() -> String {
    r#"

</body>
</html>
"#
    .to_string()
}
