pub mod auth;
pub mod db;
pub mod password;
pub mod token;
pub mod validation;

#[cfg(test)]
mod tests_props_token;
