//! CLI commands

use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use dashboard_core::{ListQuery, Role};
use dashboard_http::{
    ApiClient, LoginRequest, NewProduct, NewUser, PasswordChange, ProductUpdate, RegisterRequest,
    SessionStatus, Upload, UserUpdate,
};
use serde::Serialize;
use std::io::{BufRead, Write};
use std::path::PathBuf;
use tracing::info;

#[derive(Subcommand)]
pub enum Commands {
    /// Sign in and store credentials in the data directory
    Login {
        email: String,

        /// Password; read from stdin when omitted
        #[arg(long, env = "DASHBOARD_PASSWORD", hide_env_values = true)]
        password: Option<String>,

        /// Page to continue at after signing in
        #[arg(long)]
        return_url: Option<String>,
    },

    /// Create an account and sign in
    Register {
        #[arg(long)]
        name: String,

        #[arg(long)]
        email: String,

        /// Password; read from stdin when omitted
        #[arg(long, env = "DASHBOARD_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },

    /// Sign out and forget stored credentials
    Logout,

    /// Restore the stored session and show the signed-in user
    Whoami,

    /// Change the signed-in user's password
    Password {
        #[arg(long)]
        email: String,

        #[arg(long)]
        old: String,

        #[arg(long)]
        new: String,

        /// Repeat of the new password
        #[arg(long)]
        confirm: String,
    },

    /// Send a verification email to the signed-in user
    VerifyEmail,

    /// Manage users
    Users {
        #[command(subcommand)]
        command: UserCommands,
    },

    /// Manage products
    Products {
        #[command(subcommand)]
        command: ProductCommands,
    },

    /// Administrator operations
    Admin {
        #[command(subcommand)]
        command: AdminCommands,
    },
}

/// Pagination shared by list commands
#[derive(Args, Debug, Clone)]
pub struct PageArgs {
    /// Page number, starting at 1
    #[arg(long, default_value_t = 1)]
    page: u32,

    /// Results per page
    #[arg(long, default_value_t = ListQuery::DEFAULT_LIMIT)]
    limit: u32,

    /// Sort order, e.g. `name:asc`
    #[arg(long)]
    sort_by: Option<String>,

    /// Filter by name
    #[arg(long)]
    name: Option<String>,
}

impl PageArgs {
    fn query(&self) -> ListQuery {
        let mut query = ListQuery::new(self.page, self.limit);
        if let Some(sort_by) = &self.sort_by {
            query = query.sorted_by(sort_by);
        }
        if let Some(name) = &self.name {
            query = query.named(name);
        }
        query
    }
}

#[derive(Subcommand)]
pub enum UserCommands {
    /// List users
    List {
        #[command(flatten)]
        page: PageArgs,

        /// Filter by role
        #[arg(long)]
        role: Option<Role>,
    },

    /// Show a user
    Get { id: String },

    /// Create a user
    Create {
        #[arg(long)]
        name: String,

        #[arg(long)]
        email: String,

        #[arg(long)]
        password: String,

        #[arg(long, default_value = "user")]
        role: Role,
    },

    /// Update a profile
    Update {
        id: String,

        #[command(flatten)]
        fields: ProfileArgs,
    },

    /// Delete a user
    Delete { id: String },
}

/// Profile fields accepted by update commands
#[derive(Args, Debug, Clone)]
pub struct ProfileArgs {
    #[arg(long)]
    name: Option<String>,

    #[arg(long)]
    email: Option<String>,

    #[arg(long)]
    password: Option<String>,

    /// Image file to upload as the avatar
    #[arg(long)]
    avatar: Option<PathBuf>,
}

impl ProfileArgs {
    fn into_update(self) -> Result<UserUpdate> {
        Ok(UserUpdate {
            name: self.name,
            email: self.email,
            password: self.password,
            avatar: self.avatar.map(Upload::from_path).transpose()?,
            ..UserUpdate::default()
        })
    }
}

#[derive(Subcommand)]
pub enum ProductCommands {
    /// List products
    List {
        #[command(flatten)]
        page: PageArgs,
    },

    /// Show a product
    Get { id: String },

    /// Create a product
    Create {
        #[arg(long)]
        name: String,

        #[arg(long)]
        price: f64,

        #[arg(long)]
        color: String,

        #[arg(long = "type")]
        kind: String,
    },

    /// Update a product
    Update {
        id: String,

        #[arg(long)]
        name: Option<String>,

        #[arg(long = "type")]
        kind: Option<String>,

        #[arg(long)]
        color: Option<String>,

        #[arg(long)]
        price: Option<f64>,

        /// Image file to upload
        #[arg(long)]
        image: Option<PathBuf>,
    },

    /// Delete a product
    Delete { id: String },
}

#[derive(Subcommand)]
pub enum AdminCommands {
    /// Manage any user account
    Users {
        #[command(subcommand)]
        command: AdminUserCommands,
    },

    /// Manage every user's products
    Products {
        #[command(subcommand)]
        command: AdminProductCommands,
    },
}

#[derive(Subcommand)]
pub enum AdminUserCommands {
    /// Show a user
    Get { id: String },

    /// Update a user, including role and verification status
    Update {
        id: String,

        #[command(flatten)]
        fields: ProfileArgs,

        #[arg(long)]
        role: Option<Role>,

        /// Mark the email address as verified or not
        #[arg(long)]
        verified: Option<bool>,
    },
}

#[derive(Subcommand)]
pub enum AdminProductCommands {
    /// List products with their owners
    List {
        #[command(flatten)]
        page: PageArgs,
    },

    /// Delete a product
    Delete { id: String },
}

impl Commands {
    pub async fn execute(self, client: &ApiClient) -> Result<()> {
        match self {
            Self::Login {
                email,
                password,
                return_url,
            } => {
                let password = password_or_prompt(password)?;
                let signed_in = client
                    .session()
                    .login(&LoginRequest::new(email, password), return_url.as_deref())
                    .await?;
                info!(redirect_to = %signed_in.redirect_to, "Login complete");
                print_json(&signed_in.user)
            }
            Self::Register {
                name,
                email,
                password,
            } => {
                let details = RegisterRequest {
                    name,
                    email,
                    password: password_or_prompt(password)?,
                };
                let signed_in = client.session().register(&details, None).await?;
                print_json(&signed_in.user)
            }
            Self::Logout => {
                client.session().logout().await?;
                Ok(())
            }
            Self::Whoami => match client.session().restore_session().await? {
                SessionStatus::Authenticated { user: Some(user) } => print_json(&user),
                SessionStatus::Authenticated { user: None } => {
                    println!("Signed in");
                    Ok(())
                }
                SessionStatus::LoginRequired => Ok(()),
            },
            Self::Password {
                email,
                old,
                new,
                confirm,
            } => {
                client
                    .change_password(&PasswordChange {
                        email,
                        old_password: old,
                        new_password: new,
                        confirm_password: confirm,
                    })
                    .await?;
                println!("Password changed");
                Ok(())
            }
            Self::VerifyEmail => {
                client.send_verification_email().await?;
                println!("Verification email sent");
                Ok(())
            }
            Self::Users { command } => command.execute(client).await,
            Self::Products { command } => command.execute(client).await,
            Self::Admin { command } => command.execute(client).await,
        }
    }
}

impl UserCommands {
    pub async fn execute(self, client: &ApiClient) -> Result<()> {
        match self {
            Self::List { page, role } => {
                let mut query = page.query();
                if let Some(role) = role {
                    query = query.with_role(role.as_str());
                }
                print_json(&client.list_users(&query).await?)
            }
            Self::Get { id } => print_json(&client.get_user(&id).await?),
            Self::Create {
                name,
                email,
                password,
                role,
            } => {
                let user = NewUser {
                    name,
                    email,
                    password,
                    role,
                };
                print_json(&client.create_user(&user).await?)
            }
            Self::Update { id, fields } => {
                print_json(&client.update_user(&id, fields.into_update()?).await?)
            }
            Self::Delete { id } => {
                client.delete_user(&id).await?;
                println!("Deleted user {id}");
                Ok(())
            }
        }
    }
}

impl ProductCommands {
    pub async fn execute(self, client: &ApiClient) -> Result<()> {
        match self {
            Self::List { page } => print_json(&client.list_products(&page.query()).await?),
            Self::Get { id } => print_json(&client.get_product(&id).await?),
            Self::Create {
                name,
                price,
                color,
                kind,
            } => {
                let product = NewProduct {
                    name,
                    price,
                    color,
                    kind,
                };
                print_json(&client.create_product(&product).await?)
            }
            Self::Update {
                id,
                name,
                kind,
                color,
                price,
                image,
            } => {
                let update = ProductUpdate {
                    name,
                    kind,
                    color,
                    price,
                    image: image.map(Upload::from_path).transpose()?,
                };
                print_json(&client.update_product(&id, update).await?)
            }
            Self::Delete { id } => {
                client.delete_product(&id).await?;
                println!("Deleted product {id}");
                Ok(())
            }
        }
    }
}

impl AdminCommands {
    pub async fn execute(self, client: &ApiClient) -> Result<()> {
        match self {
            Self::Users { command } => match command {
                AdminUserCommands::Get { id } => print_json(&client.admin_get_user(&id).await?),
                AdminUserCommands::Update {
                    id,
                    fields,
                    role,
                    verified,
                } => {
                    let update = UserUpdate {
                        role,
                        is_email_verified: verified,
                        ..fields.into_update()?
                    };
                    print_json(&client.admin_update_user(&id, update).await?)
                }
            },
            Self::Products { command } => match command {
                AdminProductCommands::List { page } => {
                    print_json(&client.admin_list_products(&page.query()).await?)
                }
                AdminProductCommands::Delete { id } => {
                    client.admin_delete_product(&id).await?;
                    println!("Deleted product {id}");
                    Ok(())
                }
            },
        }
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn password_or_prompt(password: Option<String>) -> Result<String> {
    if let Some(password) = password {
        return Ok(password);
    }

    eprint!("Password: ");
    std::io::stderr().flush()?;
    let mut line = String::new();
    std::io::stdin()
        .lock()
        .read_line(&mut line)
        .context("Failed to read password from stdin")?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}
