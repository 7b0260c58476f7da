//! Prompt construction for portfolio generation.
//!
//! The prompt is a pure function of the form: the same fields always yield the
//! same text, so callers can assert on it and nothing needs caching.

use crate::domain::portfolio::PortfolioForm;

const INSTRUCTIONS: &str = "You are a professional portfolio writer. \
Write a polished, well-structured portfolio in Markdown for the person described below. \
Use a short introduction followed by sections for Skills, Experience, Education and Projects. \
Keep the tone confident and concrete, do not invent employers, degrees or projects \
that are not mentioned, and return only the Markdown document.";

pub fn build_portfolio_prompt(form: &PortfolioForm) -> String {
    let mut prompt = String::with_capacity(INSTRUCTIONS.len() + 512);
    prompt.push_str(INSTRUCTIONS);
    prompt.push_str("\n\n");

    push_section(&mut prompt, "Name", &form.name);
    push_section(&mut prompt, "Skills", &form.skills);
    push_section(&mut prompt, "Work experience", &form.experience);
    push_section(&mut prompt, "Education", &form.education);
    push_section(&mut prompt, "Projects", &form.projects);

    if !form.content.trim().is_empty() {
        push_section(&mut prompt, "Additional guidance from the author", &form.content);
    }

    prompt.truncate(prompt.trim_end().len());
    prompt
}

fn push_section(prompt: &mut String, heading: &str, value: &str) {
    prompt.push_str(heading);
    prompt.push_str(":\n");
    prompt.push_str(value.trim());
    prompt.push_str("\n\n");
}
