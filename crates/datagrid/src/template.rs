//! Template rendering for templated columns and built-in cell markup.

use minijinja::Environment;
use once_cell::sync::Lazy;
use serde::Serialize;

use crate::error::Result;

pub(crate) const ABRIDGED_STRING: &str = "abridged_string.html";
pub(crate) const PROGRESS_BAR: &str = "progress_bar.html";

/// Default `template` of the `font_awesome` column type.
pub const FONT_AWESOME_ICON: &str = r#"{%- if value -%}
<i class="fa {{ value|e }}"></i>
{%- elif options.no_value_icon -%}
<i class="fa {{ options.no_value_icon|e }}"></i>
{%- endif -%}"#;

/// Default `template` of the `select_column` column type.
pub const SELECT_ROW: &str = r#"<input type="{% if multiple %}checkbox{% else %}radio{% endif %}" name="{{ form_id|e }}[]" value="{{ id|e }}" form="{{ form_id|e }}"{% if checked %} checked{% endif %}{% if disabled %} disabled{% endif %}>"#;

/// Default `child_container_template` of the `async_child_row_trigger`
/// column type.
pub const ASYNC_CHILD_ROW: &str = r#"<span class="table-childrow-expander async-childrow" data-url="{{ url|e }}" data-refresh="{% if refresh %}true{% else %}false{% endif %}"{% if not visible %} style="display: none;"{% endif %}></span>"#;

const PROGRESS_BAR_SOURCE: &str = r#"<div class="progress"><div class="progress-bar{% if striped %} progress-bar-striped{% endif %}{% if animated %} active{% endif %}{% if additional_classes %} {{ additional_classes|e }}{% endif %}" role="progressbar" aria-valuenow="{{ progress }}" aria-valuemin="{{ min }}" aria-valuemax="{{ max }}" style="width: {{ percent }}%;">{% if show_progress %}{{ percent }}%{% endif %}</div></div>"#;

const ABRIDGED_STRING_SOURCE: &str = r#"{%- if abridged != full -%}
<span title="{{ tooltip|e }}" data-toggle="tooltip" data-container="{{ container|e }}"{% if fullscreen %} data-fullscreen="true"{% endif %}>{{ abridged|e }}</span>
{%- else -%}
{{ abridged|e }}
{%- endif -%}"#;

static ENVIRONMENT: Lazy<Environment<'static>> = Lazy::new(|| {
    let mut env = Environment::new();
    for (name, source) in [(ABRIDGED_STRING, ABRIDGED_STRING_SOURCE), (PROGRESS_BAR, PROGRESS_BAR_SOURCE)] {
        if let Err(err) = env.add_template(name, source) {
            tracing::error!(template = name, error = %err, "built-in template failed to compile");
        }
    }
    env
});

/// Renders a template string.
pub fn render_str<S: Serialize>(source: &str, context: S) -> Result<String> {
    Ok(ENVIRONMENT.render_str(source, context)?)
}

/// Renders one of the built-in templates.
pub(crate) fn render_builtin<S: Serialize>(name: &str, context: S) -> Result<String> {
    Ok(ENVIRONMENT.get_template(name)?.render(context)?)
}
