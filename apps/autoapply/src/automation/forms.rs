//! HTML form extraction and fuzzy contact-detail filling.

use scraper::{ElementRef, Html, Selector};

use crate::config::UserProfile;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Single-line `input`; the only kind contact details are written into.
    Text,
    TextArea,
    Select,
    Hidden,
    File,
    Checkbox,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormField {
    pub name: String,
    pub kind: FieldKind,
    pub value: String,
    pub placeholder: String,
    pub aria_label: String,
    pub checked: bool,
}

impl FormField {
    fn fillable(&self) -> bool {
        self.kind == FieldKind::Text
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormMethod {
    Get,
    Post,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormSpec {
    pub action: Option<String>,
    pub method: FormMethod,
    pub multipart: bool,
    pub fields: Vec<FormField>,
    pub has_submit: bool,
}

/// Which attribute a fuzzy lookup inspects.
#[derive(Clone, Copy)]
enum Hint {
    Name,
    Placeholder,
    AriaLabel,
}

impl Hint {
    fn read(self, field: &FormField) -> String {
        match self {
            Hint::Name => field.name.to_lowercase(),
            Hint::Placeholder => field.placeholder.to_lowercase(),
            Hint::AriaLabel => field.aria_label.to_lowercase(),
        }
    }
}

impl FormSpec {
    pub fn file_field(&self) -> Option<&FormField> {
        self.fields.iter().find(|f| f.kind == FieldKind::File)
    }

    /// Fills name, email, phone and location from the profile. Returns the names
    /// of the fields that were written.
    pub fn fill_contact_details(&mut self, user: &UserProfile) -> Vec<String> {
        let lookups: [(&str, Option<&str>); 3] = [
            ("name", Some(user.full_name.as_str())),
            ("email", Some(user.email.as_str())),
            ("phone", user.phone.as_deref()),
        ];
        let mut filled = Vec::new();

        for (key, value) in lookups {
            let Some(value) = value.filter(|v| !v.is_empty()) else {
                continue;
            };
            let hints = [(Hint::Name, key), (Hint::Placeholder, key), (Hint::AriaLabel, key)];
            if let Some(name) = self.fill_first(&hints, value) {
                filled.push(name);
            }
        }

        if let Some(location) = user.location.as_deref().filter(|l| !l.is_empty()) {
            let hints = [(Hint::Name, "city"), (Hint::Placeholder, "location")];
            if let Some(name) = self.fill_first(&hints, location) {
                filled.push(name);
            }
        }
        filled
    }

    fn fill_first(&mut self, hints: &[(Hint, &str)], value: &str) -> Option<String> {
        for (hint, needle) in hints {
            if let Some(field) = self
                .fields
                .iter_mut()
                .find(|f| f.fillable() && hint.read(f).contains(needle))
            {
                field.value = value.to_string();
                return Some(field.name.clone());
            }
        }
        None
    }

    /// Name/value pairs a browser would submit, file inputs excluded.
    pub fn text_pairs(&self) -> Vec<(String, String)> {
        self.fields
            .iter()
            .filter(|f| match f.kind {
                FieldKind::File => false,
                FieldKind::Checkbox => f.checked,
                FieldKind::Text | FieldKind::TextArea | FieldKind::Select | FieldKind::Hidden => {
                    true
                }
            })
            .map(|f| (f.name.clone(), f.value.clone()))
            .collect()
    }
}

/// Every form on the page, in document order.
pub fn parse_forms(html: &str) -> Vec<FormSpec> {
    let document = Html::parse_document(html);
    let Ok(form_selector) = Selector::parse("form") else {
        return Vec::new();
    };
    document.select(&form_selector).map(parse_form).collect()
}

/// Index of the form to fill: `preferred` when it exists, otherwise the first
/// form with a file input, otherwise the first form with any fillable field.
pub fn choose_form(forms: &[FormSpec], preferred: Option<usize>) -> Option<usize> {
    if let Some(index) = preferred.filter(|i| *i < forms.len()) {
        return Some(index);
    }
    forms
        .iter()
        .position(|f| f.file_field().is_some())
        .or_else(|| forms.iter().position(|f| f.fields.iter().any(FormField::fillable)))
}

fn parse_form(form: ElementRef) -> FormSpec {
    let element = form.value();
    let method = match element.attr("method") {
        Some(m) if m.eq_ignore_ascii_case("get") => FormMethod::Get,
        _ => FormMethod::Post,
    };
    let fields = collect_fields(&form);
    let multipart = element
        .attr("enctype")
        .is_some_and(|e| e.to_lowercase().contains("multipart"))
        || fields.iter().any(|f| f.kind == FieldKind::File);

    FormSpec {
        action: element.attr("action").map(|a| a.trim().to_string()),
        method,
        multipart,
        has_submit: has_submit_control(&form),
        fields,
    }
}

fn collect_fields(form: &ElementRef) -> Vec<FormField> {
    let Ok(selector) = Selector::parse("input[name], textarea[name], select[name]") else {
        return Vec::new();
    };

    form.select(&selector)
        .filter_map(|control| {
            let element = control.value();
            let name = element.attr("name")?.to_string();
            let (kind, value) = match element.name() {
                "textarea" => (FieldKind::TextArea, control.text().collect::<String>()),
                "select" => (FieldKind::Select, selected_option(&control)),
                _ => {
                    let input_type = element.attr("type").unwrap_or("text").to_lowercase();
                    let value = element.attr("value").unwrap_or("").to_string();
                    match input_type.as_str() {
                        "submit" | "button" | "image" | "reset" => return None,
                        "hidden" => (FieldKind::Hidden, value),
                        "file" => (FieldKind::File, value),
                        "checkbox" | "radio" => (
                            FieldKind::Checkbox,
                            if value.is_empty() { "on".to_string() } else { value },
                        ),
                        _ => (FieldKind::Text, value),
                    }
                }
            };

            Some(FormField {
                name,
                kind,
                value,
                placeholder: element.attr("placeholder").unwrap_or("").to_string(),
                aria_label: element.attr("aria-label").unwrap_or("").to_string(),
                checked: element.attr("checked").is_some(),
            })
        })
        .collect()
}

fn selected_option(select: &ElementRef) -> String {
    let Ok(option) = Selector::parse("option") else {
        return String::new();
    };
    let options: Vec<ElementRef> = select.select(&option).collect();
    options
        .iter()
        .find(|o| o.value().attr("selected").is_some())
        .or_else(|| options.first())
        .map(|o| {
            o.value()
                .attr("value")
                .map(str::to_string)
                .unwrap_or_else(|| o.text().collect::<String>().trim().to_string())
        })
        .unwrap_or_default()
}

fn has_submit_control(form: &ElementRef) -> bool {
    let Ok(selector) =
        Selector::parse("button, input[type='submit'], input[type='image'], [role='button']")
    else {
        return false;
    };

    form.select(&selector).any(|control| {
        let element = control.value();
        match element.name() {
            "button" => element
                .attr("type")
                .map_or(true, |t| t.eq_ignore_ascii_case("submit")),
            "input" => true,
            _ => control
                .text()
                .collect::<String>()
                .to_lowercase()
                .contains("submit"),
        }
    })
}
