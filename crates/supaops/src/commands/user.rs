//! `supaops user` handlers

use anyhow::Result;
use supaops_config::ApplicationConfig;
use supaops_supabase::{AdminUser, SupabaseAdminClient};

/// `supaops user show <email>`
pub async fn show(config: &ApplicationConfig, email: &str) -> Result<bool> {
    let client = SupabaseAdminClient::new(&config.supabase)?;
    match client.find_user_by_email(email).await? {
        Some(user) => {
            print_user(&user);
            Ok(true)
        }
        None => {
            println!("no user with email {email}");
            Ok(false)
        }
    }
}

/// `supaops user set-role <email> <role>`
pub async fn set_role(config: &ApplicationConfig, email: &str, role: &str) -> Result<bool> {
    let client = SupabaseAdminClient::new(&config.supabase)?;
    let Some(user) = client.find_user_by_email(email).await? else {
        println!("no user with email {email}");
        return Ok(false);
    };

    let updated = client.set_user_role(user.id, role).await?;
    println!("role for {email} is now {}", updated.role().unwrap_or("unset"));
    Ok(true)
}

/// `supaops user reset-password <email> --password <pw>`
pub async fn reset_password(
    config: &ApplicationConfig,
    email: &str,
    password: &str,
) -> Result<bool> {
    let client = SupabaseAdminClient::new(&config.supabase)?;
    let Some(user) = client.find_user_by_email(email).await? else {
        println!("no user with email {email}");
        return Ok(false);
    };

    client.reset_password(user.id, password).await?;
    println!("password reset for {email}");
    Ok(true)
}

fn print_user(user: &AdminUser) {
    println!("id             {}", user.id);
    println!("email          {}", user.email.as_deref().unwrap_or("-"));
    println!("role           {}", user.role().unwrap_or("-"));
    if let Some(created) = user.created_at {
        println!("created        {created}");
    }
    if let Some(seen) = user.last_sign_in_at {
        println!("last sign-in   {seen}");
    }
}
