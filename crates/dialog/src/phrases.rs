//! Bot phrase catalog
//!
//! Every sentence the bot can speak lives here, so the dialog logic
//! stays free of string literals and a localized catalog can replace
//! this one wholesale.

/// Prompt for the full name of the person to look up
pub fn ask_person_full_name() -> String {
    "What is the full name of the person you are looking for?".to_string()
}

/// Prompt for the name of the company to look up
pub fn ask_company_name() -> String {
    "What is the name of the company you are looking for?".to_string()
}

/// "{name} was not found. Do you want to try again?"
pub fn not_found_retry(name: &str) -> String {
    format!("{name} was not found. Do you want to try again?")
}

/// "The phone number of {name} was not found. Do you want to try again?"
pub fn phone_not_found_retry(name: &str) -> String {
    format!("The phone number of {name} was not found. Do you want to try again?")
}

/// Re-prompt for an unparseable confirm answer
pub fn ask_yes_or_no() -> String {
    "Please answer yes or no.".to_string()
}

/// Closing message, spoken with the accepting input hint
pub fn ask_for_request() -> String {
    "What can I do for you?".to_string()
}

/// Confirm prompt before redirecting the call
pub fn ask_forward_call() -> String {
    "Do you want me to forward the call?".to_string()
}

/// Spoken right before the call is redirected
pub fn forwarding_call() -> String {
    "I am forwarding the call.".to_string()
}

/// "The contact for {company} is {name}."
pub fn give_contact_name(company: &str, name: &str) -> String {
    format!("The contact for {company} is {name}.")
}

/// "{name} works for {company}."
pub fn give_company_name(name: &str, company: &str) -> String {
    format!("{name} works for {company}.")
}

/// "The address is {address}."
pub fn give_address(address: &str) -> String {
    format!("The address is {address}.")
}

/// "The phone number is {phone}."
pub fn give_phone_number(phone: &str) -> String {
    format!("The phone number is {phone}.")
}

/// "The email address is {email}."
pub fn give_email(email: &str) -> String {
    format!("The email address is {email}.")
}

/// "{count} opportunities were found."
pub fn give_opportunity_count(count: usize) -> String {
    match count {
        1 => "1 opportunity was found.".to_string(),
        n => format!("{n} opportunities were found."),
    }
}

/// Wraps the joined opportunity list into a sentence
pub fn give_opportunities(list: &str) -> String {
    format!("The opportunities are {list}.")
}

/// Joiner between the last two entries of an enumeration
pub fn and_word() -> &'static str {
    "and"
}

/// Fallback when several attributes were requested and none resolved
pub fn no_data_found() -> String {
    "No data was found.".to_string()
}

/// Fallback when the single requested attribute did not resolve
pub fn this_data_not_found() -> String {
    "This data was not found.".to_string()
}
