use anyhow::Result;
use clap::Args;

use admission_db::FormRepository;

#[derive(Debug, Args)]
pub struct ContactsArgs {
    /// Show at most this many messages
    #[arg(short, long, default_value_t = 20)]
    pub limit: usize,
}

pub async fn execute(repo: FormRepository, args: ContactsArgs) -> Result<()> {
    let contacts = repo.list_contacts().await?;
    println!("📬 {} contact message(s), newest first", contacts.len());
    println!("{:-<50}", "-");
    for submission in contacts.iter().take(args.limit) {
        let c = &submission.contact;
        println!("{} | {} {} <{}> {}", submission.created_at.date(), c.first_name, c.last_name, c.email, c.phone);
        println!("   Subject: {}", c.subject);
        println!("   {}", c.message);
        println!("{:-<50}", "-");
    }
    Ok(())
}
