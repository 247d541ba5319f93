use askama::Template;

use super::{navigation, NavLink, Section, SectionError};

#[derive(Template)]
#[template(path = "introduction.html")]
struct IntroductionPage {
    nav: Vec<NavLink>,
}

pub fn render() -> Result<String, SectionError> {
    let page = IntroductionPage {
        nav: navigation(Section::Introduction),
    };
    Ok(page.render()?)
}
