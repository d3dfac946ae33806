use dioxus::prelude::*;

use services::exam::QuestionView;
use testcraft_core::model::{Language, OptionId, QuestionId, QuestionOption, RunOutcome, TestCase};

use crate::vm::{ExamIntent, markdown_to_html};

#[derive(Clone, Debug, PartialEq)]
pub(super) struct PaneNav {
    pub position_label: String,
    pub can_previous: bool,
    pub can_next: bool,
}

#[component]
pub(super) fn QuestionPane(
    question: QuestionView,
    nav: PaneNav,
    running: bool,
    on_intent: EventHandler<ExamIntent>,
) -> Element {
    let label = nav.position_label.clone();
    match question {
        QuestionView::MultipleChoice {
            id,
            text,
            options,
            selected,
            is_marked,
        } => rsx! {
            div { class: "question-pane",
                QuestionHeading { id, label, is_marked, on_intent }
                QuestionText { text }
                div { class: "options",
                    for option in options.iter() {
                        OptionRow {
                            key: "{option.id}",
                            selected: selected.as_ref() == Some(&option.id),
                            question: id,
                            option: option.clone(),
                            on_intent,
                        }
                    }
                }
                if selected.is_some() {
                    button {
                        class: "btn btn-link",
                        id: "question-clear",
                        r#type: "button",
                        onclick: move |_| on_intent.call(ExamIntent::ClearAnswer(id)),
                        "Clear response"
                    }
                }
                PaneNavigation { nav, on_intent }
            }
        },
        QuestionView::Coding {
            id,
            text,
            code,
            language,
            test_cases,
            last_run,
            is_marked,
        } => rsx! {
            div { class: "question-pane question-pane--coding",
                div { class: "coding-brief",
                    QuestionHeading { id, label, is_marked, on_intent }
                    QuestionText { text }
                    TestCaseList { cases: test_cases }
                    PaneNavigation { nav, on_intent }
                }
                CodeEditor { id, code, language, last_run, running, on_intent }
            }
        },
    }
}

#[component]
fn QuestionHeading(
    id: QuestionId,
    label: String,
    is_marked: bool,
    on_intent: EventHandler<ExamIntent>,
) -> Element {
    let (class, text) = if is_marked {
        ("mark-btn mark-btn--on", "Marked")
    } else {
        ("mark-btn", "Mark for Review")
    };
    rsx! {
        div { class: "question-heading",
            h2 { "{label}" }
            button {
                class: "{class}",
                id: "question-mark",
                r#type: "button",
                onclick: move |_| on_intent.call(ExamIntent::ToggleMark(id)),
                "{text}"
            }
        }
    }
}

#[component]
fn QuestionText(text: String) -> Element {
    let html = markdown_to_html(&text);
    rsx! {
        div { class: "question-text", dangerous_inner_html: "{html}" }
    }
}

#[component]
fn OptionRow(
    question: QuestionId,
    option: QuestionOption,
    selected: bool,
    on_intent: EventHandler<ExamIntent>,
) -> Element {
    let class = if selected { "option option--selected" } else { "option" };
    let badge = option.id.as_str().to_uppercase();
    let option_id: OptionId = option.id.clone();
    rsx! {
        div {
            class: "{class}",
            role: "radio",
            aria_checked: "{selected}",
            onclick: move |_| on_intent.call(ExamIntent::SelectOption(question, option_id.clone())),
            span { class: "option__badge", "{badge}" }
            span { class: "option__text", "{option.text}" }
        }
    }
}

#[component]
fn PaneNavigation(nav: PaneNav, on_intent: EventHandler<ExamIntent>) -> Element {
    rsx! {
        div { class: "pane-nav",
            button {
                class: "btn btn-secondary",
                id: "question-previous",
                r#type: "button",
                disabled: !nav.can_previous,
                onclick: move |_| on_intent.call(ExamIntent::Previous),
                "Previous"
            }
            button {
                class: "btn btn-secondary",
                id: "question-next",
                r#type: "button",
                disabled: !nav.can_next,
                onclick: move |_| on_intent.call(ExamIntent::Next),
                "Next"
            }
        }
    }
}

#[component]
fn TestCaseList(cases: Vec<TestCase>) -> Element {
    if cases.is_empty() {
        return rsx! {};
    }
    rsx! {
        div { class: "test-cases",
            h3 { "Examples" }
            for (n, case) in cases.iter().enumerate() {
                div { key: "{n}", class: "test-case",
                    p { class: "test-case__label", "Input" }
                    pre { "{case.input}" }
                    p { class: "test-case__label", "Expected output" }
                    pre { "{case.expected_output}" }
                }
            }
        }
    }
}

#[component]
fn CodeEditor(
    id: QuestionId,
    code: String,
    language: Language,
    last_run: Option<RunOutcome>,
    running: bool,
    on_intent: EventHandler<ExamIntent>,
) -> Element {
    let file_name = format!("main.{}", language.extension());
    rsx! {
        div { class: "code-editor",
            div { class: "code-editor__toolbar",
                span { class: "code-editor__file", "{file_name}" }
                select {
                    id: "code-language",
                    value: "{language.id()}",
                    onchange: move |evt| {
                        if let Ok(language) = evt.value().parse::<Language>() {
                            on_intent.call(ExamIntent::SetLanguage(id, language));
                        }
                    },
                    for choice in Language::ALL {
                        option { key: "{choice.id()}", value: "{choice.id()}", selected: choice == language,
                            "{choice.display_name()}"
                        }
                    }
                }
                button {
                    class: "btn btn-primary",
                    id: "code-run",
                    r#type: "button",
                    disabled: running,
                    onclick: move |_| on_intent.call(ExamIntent::RunCode(id)),
                    if running { "Running..." } else { "Run Code" }
                }
            }
            textarea {
                class: "code-editor__input",
                id: "code-input",
                spellcheck: "false",
                value: "{code}",
                oninput: move |evt| on_intent.call(ExamIntent::EditCode(id, evt.value())),
            }
            div { class: "code-editor__output",
                match last_run {
                    None => rsx! {
                        p { class: "run-output run-output--empty", "Run your code to see the output here." }
                    },
                    Some(outcome) => {
                        let (class, status) = run_status(&outcome);
                        rsx! {
                            p { class: "{class}", "{status}" }
                            pre { class: "run-output", "{outcome.output}" }
                        }
                    }
                }
            }
        }
    }
}

fn run_status(outcome: &RunOutcome) -> (&'static str, &'static str) {
    if outcome.passed {
        ("run-output__status run-output__status--pass", "All test cases passed")
    } else {
        ("run-output__status run-output__status--fail", "Some test cases failed")
    }
}
