//! Pie charts of spending per category.
//!
//! Two ECharts option sets are generated from the same [CategorySummary]:
//! one sized by the number of expenses and one sized by the amount spent.
//! The page shows the count chart first and the buttons above the chart switch
//! between the two without another request.

use charming::{
    Chart,
    component::{Legend, Title},
    element::{JsFunction, Tooltip, Trigger},
    series::Pie,
};
use maud::{Markup, PreEscaped, html};

use crate::{
    expense::CategorySummary,
    html::{
        BUTTON_SECONDARY_STYLE, HeadElement, TABLE_CELL_STYLE, TABLE_HEADER_STYLE,
        TABLE_ROW_STYLE, format_currency,
    },
};

/// The HTML element ID of the chart container.
const CHART_ID: &str = "expense-chart";
const ECHARTS_SCRIPT: &str = "/static/echarts.6.0.0.min.js";

/// How many times to check whether ECharts has loaded before giving up.
const READINESS_ATTEMPTS: u32 = 50;
/// Milliseconds between readiness checks.
const READINESS_INTERVAL_MS: u32 = 100;

pub(super) const CHART_LOAD_FAILED_MESSAGE: &str =
    "Chart could not be loaded. Please refresh the page.";
pub(super) const EMPTY_CHART_MESSAGE: &str = "No expenses to chart";

/// Pie chart of the number of expenses per category.
pub(super) fn count_chart(summary: &CategorySummary) -> Chart {
    let data = summary
        .iter()
        .map(|(label, count, _)| (count as f64, label))
        .collect::<Vec<_>>();

    Chart::new()
        .title(Title::new().text("Expenses by Category").subtext("Count"))
        .tooltip(Tooltip::new().trigger(Trigger::Item))
        .legend(Legend::new().bottom(0))
        .series(Pie::new().name("Count").radius("60%").data(data))
}

/// Pie chart of the amount spent per category.
pub(super) fn amount_chart(summary: &CategorySummary) -> Chart {
    let data = summary
        .iter()
        .map(|(label, _, amount)| (amount, label))
        .collect::<Vec<_>>();

    Chart::new()
        .title(
            Title::new()
                .text("Expenses by Category")
                .subtext("Amount ($)"),
        )
        .tooltip(
            Tooltip::new()
                .trigger(Trigger::Item)
                .value_formatter(currency_formatter()),
        )
        .legend(Legend::new().bottom(0))
        .series(Pie::new().name("Amount ($)").radius("60%").data(data))
}

fn currency_formatter() -> JsFunction {
    JsFunction::new_with_args(
        "number",
        "const currencyFormatter = new Intl.NumberFormat('en-US', {
              style: 'currency',
              currency: 'USD'
            });
            return currencyFormatter.format(number);",
    )
}

/// The scripts the chart section needs in the page head.
///
/// Nothing is loaded when there is nothing to chart.
pub(super) fn chart_head_elements(summary: &CategorySummary) -> Vec<HeadElement> {
    if summary.is_empty() {
        return Vec::new();
    }

    vec![
        HeadElement::ScriptLink(ECHARTS_SCRIPT.to_owned()),
        chart_script(summary),
    ]
}

/// Embed `chart` as a JavaScript object literal.
///
/// Category names are user supplied so a closing script tag must not end the
/// script early.
fn chart_options(chart: &Chart) -> String {
    chart.to_string().replace("</", "<\\/")
}

fn chart_script(summary: &CategorySummary) -> HeadElement {
    let script = format!(
        r#"document.addEventListener('DOMContentLoaded', function() {{
    const container = document.getElementById("{CHART_ID}");
    if (!container) {{
        return;
    }}

    const options = {{
        count: {count_options},
        amount: {amount_options}
    }};

    const waitForECharts = (attempts, interval) => new Promise((resolve, reject) => {{
        const check = (remaining) => {{
            if (typeof window.echarts !== 'undefined') {{
                resolve(window.echarts);
            }} else if (remaining <= 1) {{
                reject(new Error('ECharts did not load'));
            }} else {{
                setTimeout(() => check(remaining - 1), interval);
            }}
        }};
        check(attempts);
    }});

    waitForECharts({READINESS_ATTEMPTS}, {READINESS_INTERVAL_MS})
        .then((echarts) => {{
            const chart = echarts.init(container);
            const buttons = document.querySelectorAll('[data-chart-option]');
            const show = (key) => {{
                chart.setOption(options[key], true);
                buttons.forEach((button) => {{
                    button.setAttribute('aria-pressed', String(button.dataset.chartOption === key));
                }});
            }};

            buttons.forEach((button) => {{
                button.addEventListener('click', () => show(button.dataset.chartOption));
            }});
            window.addEventListener('resize', chart.resize);

            const darkModeMediaQuery = window.matchMedia('(prefers-color-scheme: dark)');
            const updateTheme = () => {{
                chart.setTheme(darkModeMediaQuery.matches ? 'dark' : 'default');
            }};
            darkModeMediaQuery.addEventListener('change', updateTheme);
            updateTheme();

            show('count');
        }})
        .catch(() => {{
            container.textContent = "{CHART_LOAD_FAILED_MESSAGE}";
        }});
}});"#,
        count_options = chart_options(&count_chart(summary)),
        amount_options = chart_options(&amount_chart(summary)),
    );

    HeadElement::ScriptSource(PreEscaped(script))
}

/// The summary as JSON with `labels`, `count_data` and `amount_data` keys.
fn summary_json(summary: &CategorySummary) -> Option<String> {
    serde_json::to_string(summary)
        .inspect_err(|error| tracing::error!("could not serialize category summary: {error}"))
        .ok()
}

/// The chart container with its toggle buttons and a summary table.
///
/// The container carries the summary in its `data-summary` attribute.
pub(super) fn chart_view(summary: &CategorySummary) -> Markup {
    html!(
        section id="chart-section" class="w-full space-y-4"
        {
            @if summary.is_empty() {
                p class="text-center text-gray-500 dark:text-gray-400"
                {
                    (EMPTY_CHART_MESSAGE)
                }
            } @else {
                div class="flex gap-2"
                {
                    button
                        type="button"
                        data-chart-option="count"
                        aria-pressed="true"
                        class=(BUTTON_SECONDARY_STYLE)
                    {
                        "Count"
                    }

                    button
                        type="button"
                        data-chart-option="amount"
                        aria-pressed="false"
                        class=(BUTTON_SECONDARY_STYLE)
                    {
                        "Amount ($)"
                    }
                }

                div
                    id=(CHART_ID)
                    data-summary=[summary_json(summary)]
                    class="min-h-[380px] rounded dark:bg-gray-100"
                {}

                (summary_table(summary))
            }
        }
    )
}

fn summary_table(summary: &CategorySummary) -> Markup {
    html!(
        table id="category-summary" class="w-full text-sm text-left text-gray-500 dark:text-gray-400"
        {
            thead class=(TABLE_HEADER_STYLE)
            {
                tr
                {
                    th scope="col" class=(TABLE_CELL_STYLE) { "Category" }
                    th scope="col" class=(TABLE_CELL_STYLE) { "Count" }
                    th scope="col" class=(TABLE_CELL_STYLE) { "Amount" }
                }
            }

            tbody
            {
                @for (label, count, amount) in summary.iter() {
                    tr class=(TABLE_ROW_STYLE)
                    {
                        td class=(TABLE_CELL_STYLE) { (label) }
                        td class=(TABLE_CELL_STYLE) { (count) }
                        td class=(TABLE_CELL_STYLE) { (format_currency(amount)) }
                    }
                }
            }
        }
    )
}

#[cfg(test)]
mod tests {
    use scraper::{Html, Selector};

    use crate::{expense::CategorySummary, html::HeadElement};

    use super::{
        CHART_ID, CHART_LOAD_FAILED_MESSAGE, EMPTY_CHART_MESSAGE, amount_chart,
        chart_head_elements, chart_view, count_chart,
    };

    fn summary() -> CategorySummary {
        CategorySummary {
            labels: vec!["Food & Dining".to_owned(), "Transportation".to_owned()],
            count_data: vec![2, 1],
            amount_data: vec![19.75, 45.0],
        }
    }

    #[test]
    fn count_chart_uses_counts() {
        let options = count_chart(&summary()).to_string();

        assert!(options.contains("\"Food & Dining\""), "got {options}");
        assert!(options.contains("\"pie\""), "got {options}");
        assert!(options.contains("2.0") || options.contains(":2"), "got {options}");
    }

    #[test]
    fn amount_chart_uses_amounts() {
        let options = amount_chart(&summary()).to_string();

        assert!(options.contains("19.75"), "got {options}");
        assert!(options.contains("Amount ($)"), "got {options}");
    }

    #[test]
    fn empty_summary_shows_message_without_chart() {
        let html = Html::parse_fragment(&chart_view(&CategorySummary::default()).into_string());

        let text = html.root_element().text().collect::<String>();
        assert!(text.contains(EMPTY_CHART_MESSAGE));
        let container = Selector::parse(&format!("#{CHART_ID}")).unwrap();
        assert!(html.select(&container).next().is_none());
        assert!(chart_head_elements(&CategorySummary::default()).is_empty());
    }

    #[test]
    fn chart_view_has_toggle_buttons_and_summary_table() {
        let html = Html::parse_fragment(&chart_view(&summary()).into_string());

        let buttons = html
            .select(&Selector::parse("button[data-chart-option]").unwrap())
            .map(|button| button.text().collect::<String>().trim().to_owned())
            .collect::<Vec<_>>();
        assert_eq!(buttons, vec!["Count", "Amount ($)"]);

        let container = html
            .select(&Selector::parse(&format!("#{CHART_ID}")).unwrap())
            .next()
            .expect("No chart container found");
        let embedded: serde_json::Value =
            serde_json::from_str(container.attr("data-summary").unwrap()).unwrap();
        assert_eq!(
            embedded,
            serde_json::json!({
                "labels": ["Food & Dining", "Transportation"],
                "count_data": [2, 1],
                "amount_data": [19.75, 45.0],
            })
        );

        let rows = html
            .select(&Selector::parse("#category-summary tbody tr").unwrap())
            .map(|row| {
                row.select(&Selector::parse("td").unwrap())
                    .map(|cell| cell.text().collect::<String>())
                    .collect::<Vec<_>>()
            })
            .collect::<Vec<_>>();
        assert_eq!(
            rows,
            vec![
                vec!["Food & Dining", "2", "$19.75"],
                vec!["Transportation", "1", "$45.00"],
            ]
        );
    }

    #[test]
    fn script_waits_for_echarts_then_falls_back() {
        let elements = chart_head_elements(&summary());

        let script = elements
            .iter()
            .find_map(|element| match element {
                HeadElement::ScriptSource(source) => Some(source.0.clone()),
                _ => None,
            })
            .expect("No chart script found");
        assert!(script.contains("waitForECharts(50, 100)"));
        assert!(script.contains(CHART_LOAD_FAILED_MESSAGE));
        assert!(
            elements
                .iter()
                .any(|element| matches!(element, HeadElement::ScriptLink(path) if path.ends_with("echarts.6.0.0.min.js")))
        );
    }

    #[test]
    fn category_names_cannot_close_the_script() {
        let summary = CategorySummary {
            labels: vec!["</script><script>alert(1)</script>".to_owned()],
            count_data: vec![1],
            amount_data: vec![1.0],
        };

        let elements = chart_head_elements(&summary);

        for element in elements {
            if let HeadElement::ScriptSource(source) = element {
                assert!(!source.0.contains("</script>"));
            }
        }
    }
}
