use dioxus::prelude::*;
use dioxus_router::{Outlet, Routable};

use crate::views::{ExamView, RankingView};

#[derive(Clone, Routable, PartialEq)]
#[rustfmt::skip]
pub enum Route {
    #[layout(Layout)]
        #[route("/", ExamView)] Exam {},
        #[route("/ranking", RankingView)] Ranking {},
}

#[component]
fn Layout() -> Element {
    rsx! {
        div { class: "app",
            main { class: "content",
                Outlet::<Route> {}
            }
        }
    }
}
