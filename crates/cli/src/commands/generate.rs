//! Test Data Commands

use anyhow::Result;
use clap::Subcommand;
use serde::Serialize;

use cedar_qa_common::{datagen, Pet};

use crate::output::{print_item, OutputFormat, TableDisplay};

#[derive(Subcommand)]
pub enum GenerateCommands {
    /// Random pet record
    Pet,
    /// Random sign-up email address
    Email,
    /// Random password
    Password,
    /// Random email and password pair
    Credentials,
}

#[derive(Serialize)]
#[serde(transparent)]
pub struct PetDisplay(pub Pet);

impl TableDisplay for PetDisplay {
    fn headers() -> Vec<&'static str> {
        vec!["ID", "Name", "Category", "Tags", "Status"]
    }

    fn row(&self) -> Vec<String> {
        let pet = &self.0;
        vec![
            pet.id.to_string(),
            pet.name.clone(),
            pet.category.name.clone(),
            pet.tags.iter().map(|t| t.name.as_str()).collect::<Vec<_>>().join(", "),
            pet.status.to_string(),
        ]
    }
}

#[derive(Serialize)]
pub struct CredentialsDisplay {
    pub email: String,
    pub password: String,
}

impl TableDisplay for CredentialsDisplay {
    fn headers() -> Vec<&'static str> {
        vec!["Email", "Password"]
    }

    fn row(&self) -> Vec<String> {
        vec![self.email.clone(), self.password.clone()]
    }
}

pub fn execute(cmd: GenerateCommands, format: OutputFormat) -> Result<bool> {
    match cmd {
        GenerateCommands::Pet => {
            print_item(&PetDisplay(datagen::generate_random_pet()), format)?;
        }
        GenerateCommands::Email => println!("{}", datagen::create_random_email()),
        GenerateCommands::Password => println!("{}", datagen::create_random_password()),
        GenerateCommands::Credentials => {
            let credentials = datagen::random_credentials();
            print_item(
                &CredentialsDisplay {
                    email: credentials.email,
                    password: credentials.password,
                },
                format,
            )?;
        }
    }
    Ok(true)
}
