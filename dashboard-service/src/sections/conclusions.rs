use askama::Template;

use super::{navigation, NavLink, Section, SectionError};

#[derive(Template)]
#[template(path = "conclusions.html")]
struct ConclusionsPage {
    nav: Vec<NavLink>,
}

pub fn render() -> Result<String, SectionError> {
    let page = ConclusionsPage {
        nav: navigation(Section::Conclusions),
    };
    Ok(page.render()?)
}
