use dioxus::prelude::*;
use dioxus_router::Link;
use services::ranking_service::for_user;
use testcraft_core::model::Ranking;
use tracing::warn;

use crate::context::{AppContext, CurrentUser};
use crate::routes::Route;
use crate::views::{ViewError, ViewState, view_state_from_resource};
use crate::vm::{RankingRowVm, RankingSort, RankingSortField, arrange_rows};

#[derive(Clone, Debug, PartialEq)]
struct RankingData {
    rows: Vec<Ranking>,
}

#[component]
pub fn RankingView() -> Element {
    let ctx = use_context::<AppContext>();
    let rankings = ctx.rankings();
    let current_user = try_use_context::<CurrentUser>();
    let mut query = use_signal(String::new);
    let mut sort = use_signal(RankingSort::default);

    let resource = use_resource(move || {
        let rankings = rankings.clone();
        async move {
            let rows = rankings.rankings().await.map_err(|err| {
                warn!(error = %err, "rankings unavailable");
                ViewError::Unavailable
            })?;
            Ok(RankingData { rows })
        }
    });

    let state = view_state_from_resource(resource);
    let me = current_user.and_then(|CurrentUser(user)| user.read().as_ref().cloned());
    let sort_now = sort();

    rsx! {
        div { class: "page ranking-page",
            div { class: "ranking-page__header",
                h2 { "Rankings" }
                input {
                    class: "ranking-search",
                    id: "ranking-search",
                    r#type: "text",
                    placeholder: "Search by name",
                    value: "{query}",
                    oninput: move |evt| query.set(evt.value()),
                }
                Link { class: "btn btn-secondary", to: Route::Exam {}, "Back to test" }
            }

            match state {
                ViewState::Idle => rsx! {
                    p { "Idle" }
                },
                ViewState::Loading => rsx! {
                    p { "Loading..." }
                },
                ViewState::Ready(data) => {
                    let mine = me.as_ref().and_then(|id| for_user(&data.rows, id)).map(RankingRowVm::from);
                    let rows = arrange_rows(&data.rows, &query.read(), sort_now, me.as_ref());
                    rsx! {
                        if let Some(card) = mine {
                            YourRanking { row: card }
                        }
                        if data.rows.is_empty() {
                            p { "No results yet." }
                        } else if rows.is_empty() {
                            p { class: "ranking-empty", "No one matches this search." }
                        } else {
                            table { class: "ranking-table",
                                thead {
                                    tr {
                                        th { "Rank" }
                                        th { "Name" }
                                        th { "Organization" }
                                        SortHeader {
                                            label: "Tests",
                                            field: RankingSortField::Tests,
                                            sort: sort_now,
                                            on_sort: move |field| sort.set(sort_now.toggle(field)),
                                        }
                                        th { "Total score" }
                                        SortHeader {
                                            label: "Average",
                                            field: RankingSortField::Average,
                                            sort: sort_now,
                                            on_sort: move |field| sort.set(sort_now.toggle(field)),
                                        }
                                    }
                                }
                                tbody {
                                    for row in rows {
                                        RankingRow { key: "{row.user_id}", row }
                                    }
                                }
                            }
                        }
                    }
                }
                ViewState::Error(err) => rsx! {
                    p { "{err.message()}" }
                    button {
                        class: "btn btn-secondary",
                        r#type: "button",
                        onclick: move |_| {
                            let mut resource = resource;
                            resource.restart();
                        },
                        "Retry"
                    }
                },
            }
        }
    }
}

#[component]
fn SortHeader(
    label: &'static str,
    field: RankingSortField,
    sort: RankingSort,
    on_sort: EventHandler<RankingSortField>,
) -> Element {
    let aria = sort.aria(field);
    let arrow = match aria {
        "ascending" => " ▲",
        "descending" => " ▼",
        _ => "",
    };
    rsx! {
        th { class: "ranking-sort", aria_sort: "{aria}",
            button {
                class: "ranking-sort__btn",
                r#type: "button",
                onclick: move |_| on_sort.call(field),
                "{label}{arrow}"
            }
        }
    }
}

#[component]
fn YourRanking(row: RankingRowVm) -> Element {
    rsx! {
        section { class: "ranking-card", id: "ranking-you",
            h3 { "Your ranking" }
            p { class: "ranking-card__rank", "#{row.rank}" }
            p { class: "ranking-card__name", "{row.name}" }
            dl {
                dt { "Average score" }
                dd { "{row.average_str}" }
                dt { "Tests completed" }
                dd { "{row.tests_completed}" }
            }
        }
    }
}

#[component]
fn RankingRow(row: RankingRowVm) -> Element {
    let mut class = String::from("ranking-row");
    if row.is_podium {
        class.push_str(" ranking-row--podium");
    }
    if row.is_current_user {
        class.push_str(" ranking-row--you");
    }
    rsx! {
        tr { class: "{class}",
            td { class: "ranking-row__rank", "{row.rank}" }
            td { "{row.name}" }
            td { "{row.organization}" }
            td { "{row.tests_completed}" }
            td { "{row.total_score}" }
            td { "{row.average_str}" }
        }
    }
}
