use clap::{Args, Parser, Subcommand};
use miette::{IntoDiagnostic, Result, miette};
use rust_decimal::Decimal;
use tipzed::application::flow::{FlowStep, TipFlow};
use tipzed::config::{ClientConfig, Secret, parse_timeout};
use tipzed::domain::payout::PayoutAccount;
use tipzed::domain::phone::{detect_provider, validate_mobile_number};
use tipzed::domain::ports::{PaymentGatewayBox, PayoutAccountStoreBox};
use tipzed::domain::provider::Provider;
use tipzed::domain::tip::WalletId;
use tipzed::infrastructure::http::{HttpPaymentGateway, Session};
use tipzed::infrastructure::in_memory::{InMemoryGateway, accepted_deposit, status_report};
use tipzed::interfaces::render::describe;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Base URL of the tipping API (overrides TIPZED_API_URL)
    #[arg(long, global = true)]
    api_url: Option<String>,

    /// Bearer token for the API (overrides TIPZED_API_TOKEN)
    #[arg(long, global = true)]
    token: Option<String>,

    /// Seconds to wait for each gateway call (overrides TIPZED_TIMEOUT_SECS)
    #[arg(long, global = true)]
    timeout_secs: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the mobile-money provider owning a number
    Detect { number: String },

    /// Validate a mobile number and print its international form
    Validate { number: String },

    /// Send a tip and follow it until the gateway settles it
    Tip(TipArgs),

    /// Query the gateway once for a deposit's status
    Status {
        deposit_id: String,

        /// Use an in-memory gateway that reports this status instead of the API
        #[arg(long)]
        simulate: Option<String>,
    },

    /// Set the mobile-money account creator earnings are paid out to
    Payout(PayoutArgs),
}

#[derive(Args)]
struct TipArgs {
    /// Wallet id of the creator receiving the tip
    #[arg(long)]
    wallet: String,

    /// Amount in Kwacha
    #[arg(long)]
    amount: Decimal,

    /// Payer mobile number
    #[arg(long)]
    phone: String,

    /// Payer email
    #[arg(long)]
    email: String,

    /// Gateway provider id (e.g. AIRTEL_OAPI_ZMB). Detected from the number if omitted.
    #[arg(long)]
    provider: Option<String>,

    /// Note attached to the tip
    #[arg(long)]
    message: Option<String>,

    /// Perform one manual status check after submitting
    #[arg(long)]
    check: bool,

    /// Use an in-memory gateway that reports this status instead of the API
    #[arg(long)]
    simulate: Option<String>,
}

#[derive(Args)]
struct PayoutArgs {
    /// Mobile number receiving payouts
    #[arg(long)]
    phone: String,

    /// Name registered with the mobile-money account
    #[arg(long)]
    name: String,

    /// Gateway provider id. Detected from the number if omitted.
    #[arg(long)]
    provider: Option<String>,

    /// Use an empty in-memory account store instead of the API
    #[arg(long)]
    simulate: bool,
}

impl Cli {
    fn client_config(&self) -> Result<ClientConfig> {
        let mut config = ClientConfig::from_env().into_diagnostic()?;
        if let Some(api_url) = &self.api_url {
            config.api_url = api_url.clone();
        }
        if let Some(token) = &self.token {
            config.token = Some(Secret::new(token.clone()));
        }
        if let Some(raw) = &self.timeout_secs {
            config.timeout = parse_timeout(raw).into_diagnostic()?;
        }
        Ok(config)
    }
}

async fn gateway_for(config: &ClientConfig, simulate: Option<&str>) -> Result<PaymentGatewayBox> {
    match simulate {
        Some(status) => {
            let gateway = InMemoryGateway::new();
            gateway
                .push_deposit(Ok(accepted_deposit(status, Some("sim-1"))))
                .await;
            gateway.push_status(Ok(status_report(status))).await;
            Ok(Box::new(gateway))
        }
        None => {
            let gateway =
                HttpPaymentGateway::new(config, Session::from_config(config)).into_diagnostic()?;
            Ok(Box::new(gateway))
        }
    }
}

fn payout_store_for(config: &ClientConfig, simulate: bool) -> Result<PayoutAccountStoreBox> {
    if simulate {
        return Ok(Box::new(InMemoryGateway::new()));
    }
    let gateway =
        HttpPaymentGateway::new(config, Session::from_config(config)).into_diagnostic()?;
    Ok(Box::new(gateway))
}

fn print_step(flow: &TipFlow) {
    let snapshot = flow.snapshot();
    println!("[{}] {}", snapshot.step, describe(&snapshot));
}

async fn run_tip(config: &ClientConfig, args: TipArgs) -> Result<()> {
    let TipArgs {
        wallet,
        amount,
        phone,
        email,
        provider,
        message,
        check,
        simulate,
    } = args;

    let provider_id = match provider {
        Some(id) => id,
        None => detect_provider(&phone)
            .map(|p| p.gateway_id().to_string())
            .ok_or_else(|| miette!("Could not detect a provider for {phone}; pass --provider"))?,
    };

    let gateway = gateway_for(config, simulate.as_deref()).await?;
    let wallet_id = WalletId::new(wallet).into_diagnostic()?;
    let mut flow = TipFlow::new(gateway, wallet_id, email).with_timeout(config.timeout);
    flow.set_message(message);

    flow.select_amount(amount).into_diagnostic()?;
    print_step(&flow);

    flow.submit_payment(&phone, &provider_id)
        .await
        .into_diagnostic()?;
    print_step(&flow);

    if check
        && matches!(
            flow.step(),
            FlowStep::Processing | FlowStep::Pending | FlowStep::TimedOut
        )
    {
        flow.check_status().await.into_diagnostic()?;
        print_step(&flow);
    }

    let outcome = flow.step();
    flow.close();
    match outcome {
        FlowStep::Error => Err(miette!(
            "Tip failed: {}",
            flow.error_message().unwrap_or("unknown error")
        )),
        _ => Ok(()),
    }
}

async fn run_payout(config: &ClientConfig, args: PayoutArgs) -> Result<()> {
    let provider = args
        .provider
        .as_deref()
        .map(str::parse::<Provider>)
        .transpose()
        .into_diagnostic()?;
    let account = PayoutAccount::new(&args.phone, &args.name, provider).into_diagnostic()?;

    let store = payout_store_for(config, args.simulate)?;
    let existing = store.fetch_payout_account().await.into_diagnostic()?;
    let record = store
        .update_payout_account(&account)
        .await
        .map_err(|e| miette!("Failed to save payout account: {e}"))?;

    if existing.is_some() {
        println!("Payout account updated successfully!");
    } else {
        println!("Payout account added successfully!");
    }
    println!("{} via {}", record.phone_number, record.provider);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let config = cli.client_config();
    match cli.command {
        Command::Detect { number } => {
            match detect_provider(&number) {
                Some(provider) => {
                    println!("{} ({})", provider, provider.gateway_id());
                    println!("{}", provider.logo_url());
                }
                None => println!("unknown"),
            }
            Ok(())
        }
        Command::Validate { number } => {
            let check = validate_mobile_number(&number);
            if !check.is_valid {
                return Err(miette!("{}", check.error.unwrap_or("Invalid mobile number")));
            }
            println!(
                "{} {}",
                check.formatted.unwrap_or_default(),
                check.carrier.unwrap_or("Unknown")
            );
            Ok(())
        }
        Command::Tip(args) => run_tip(&config?, args).await,
        Command::Payout(args) => run_payout(&config?, args).await,
        Command::Status {
            deposit_id,
            simulate,
        } => {
            let config = config?;
            let gateway = gateway_for(&config, simulate.as_deref()).await?;
            let report = tokio::time::timeout(config.timeout, gateway.check_status(&deposit_id))
                .await
                .map_err(|_| miette!("Gateway did not answer within {:?}", config.timeout))?
                .into_diagnostic()?;
            println!("{} {:?}", report.status, report.status.bucket());
            if let Some(message) = report.message {
                println!("{message}");
            }
            Ok(())
        }
    }
}
