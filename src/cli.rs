use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};
use storefront_core::config::{API_TOKEN_VAR, API_URL_VAR, TIMEOUT_VAR};
use storefront_core::domain::cart::{Cart, ProductId};
use storefront_core::domain::order::{Document, Order, OrderId, ReturnRequest};
use storefront_core::domain::stock::{StockSnapshot, StockStatus};
use storefront_core::{
    connect, ClientConfig, DomainError, HttpCommerceBackend, OrderService, Storefront,
};

#[derive(Debug, Parser)]
#[command(name = "storefront", about = "Storefront cart and order client", long_about = None)]
pub(crate) struct Cli {
    /// Base URL of the commerce backend
    #[arg(long, env = "STOREFRONT_API_URL")]
    api_url: String,

    /// Bearer token of the signed-in customer
    #[arg(long, env = "STOREFRONT_API_TOKEN", hide_env_values = true)]
    api_token: Option<String>,

    /// Request timeout in seconds [default: 10]
    #[arg(long, env = "STOREFRONT_HTTP_TIMEOUT_SECS")]
    timeout_secs: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    #[command(subcommand)]
    Cart(CartCommand),
    /// Place an order from the current cart
    Checkout,
    #[command(subcommand)]
    Orders(OrdersCommand),
    #[command(subcommand)]
    Pay(PayCommand),
}

#[derive(Debug, Subcommand)]
enum CartCommand {
    Show,
    Add {
        product_id: ProductId,
        #[arg(default_value_t = 1)]
        quantity: u32,
    },
    Update {
        product_id: ProductId,
        quantity: u32,
    },
    /// Add one unit, refusing locally when the known stock is exhausted
    Increment {
        product_id: ProductId,
        /// Last known available stock for the product
        #[arg(long)]
        available: Option<u32>,
    },
    /// Remove one unit; the last unit drops the line
    Decrement { product_id: ProductId },
    Remove { product_id: ProductId },
    Clear,
}

#[derive(Debug, Subcommand)]
enum OrdersCommand {
    List,
    Show { id: OrderId },
    Cancel { id: OrderId },
    Return(ReturnArgs),
    Invoice(DownloadArgs),
    Label(DownloadArgs),
}

#[derive(Debug, Args)]
struct ReturnArgs {
    id: OrderId,
    #[arg(long)]
    reason: String,
    #[arg(long)]
    comment: Option<String>,
}

#[derive(Debug, Args)]
struct DownloadArgs {
    id: OrderId,
    /// File to write the document to
    #[arg(long)]
    out: PathBuf,
}

#[derive(Debug, Subcommand)]
enum PayCommand {
    /// Open a payment session for a pending order
    Start { id: OrderId },
    /// Confirm a payment session after the provider redirects back
    Confirm { session_id: String },
}

impl Cli {
    pub(crate) async fn run(self) -> Result<(), String> {
        let config = ClientConfig::from_lookup(|var| match var {
            API_URL_VAR => Some(self.api_url.clone()),
            API_TOKEN_VAR => self.api_token.clone(),
            TIMEOUT_VAR => self.timeout_secs.clone(),
            _ => None,
        })
        .map_err(|e| format!("invalid configuration: {e}"))?;
        let storefront = connect(config).map_err(|e| format!("failed to build client: {e}"))?;

        match self.command {
            Commands::Cart(command) => run_cart(&storefront, command).await,
            Commands::Checkout => {
                storefront.cart.load().await.map_err(describe)?;
                let receipt = storefront.checkout.checkout().await.map_err(describe)?;
                println!("order_id: {}", receipt.order_id);
                println!("reference: {}", receipt.reference);
                Ok(())
            }
            Commands::Orders(command) => run_orders(&storefront, command).await,
            Commands::Pay(command) => run_pay(&storefront, command).await,
        }
    }
}

async fn run_cart(
    storefront: &Storefront<HttpCommerceBackend>,
    command: CartCommand,
) -> Result<(), String> {
    let store = &storefront.cart;
    let cart = match command {
        CartCommand::Show => store.load().await,
        CartCommand::Add {
            product_id,
            quantity,
        } => store.add(product_id, quantity).await,
        CartCommand::Update {
            product_id,
            quantity,
        } => store.update(product_id, quantity).await,
        CartCommand::Increment {
            product_id,
            available,
        } => {
            let current = store.load().await.map_err(describe)?.quantity_of(product_id);
            match incremented(product_id, current, available)? {
                1 => store.add(product_id, 1).await,
                next => store.update(product_id, next).await,
            }
        }
        CartCommand::Decrement { product_id } => {
            match store.load().await.map_err(describe)?.quantity_of(product_id) {
                0 => return Err(format!("product {product_id} is not in the cart")),
                1 => store.remove(product_id).await,
                current => store.update(product_id, current - 1).await,
            }
        }
        CartCommand::Remove { product_id } => store.remove(product_id).await,
        CartCommand::Clear => store.clear().await,
    };

    match cart {
        Ok(cart) => {
            print_cart(&cart);
            Ok(())
        }
        Err(e) => {
            // The store has already re-read the cart after a stock rejection.
            if e.requires_refetch() {
                if let Some(current) = store.snapshot() {
                    print_cart(&current);
                }
            }
            Err(describe(e))
        }
    }
}

/// The quantity one increment asks for, refused locally when the last
/// known stock says the backend would reject it.
fn incremented(product_id: ProductId, current: u32, available: Option<u32>) -> Result<u32, String> {
    if let Some(available_quantity) = available {
        let stock = StockSnapshot {
            product_id,
            available_quantity,
        };
        match stock.status_for(current) {
            StockStatus::OutOfStock => return Err(format!("product {product_id} is out of stock")),
            StockStatus::AtMax => {
                return Err(format!(
                    "only {available_quantity} of product {product_id} available"
                ))
            }
            StockStatus::Available => {}
        }
    }
    current
        .checked_add(1)
        .ok_or_else(|| format!("quantity of product {product_id} cannot grow further"))
}

async fn run_orders(
    storefront: &Storefront<HttpCommerceBackend>,
    command: OrdersCommand,
) -> Result<(), String> {
    let orders = &storefront.orders;
    match command {
        OrdersCommand::List => {
            for order in orders.my_orders().await.map_err(describe)? {
                println!(
                    "{}\t{}\t{}\t{}",
                    order.id, order.reference, order.status, order.total_amount
                );
            }
        }
        OrdersCommand::Show { id } => print_order(&orders.get_order(id).await.map_err(describe)?),
        OrdersCommand::Cancel { id } => {
            let order = orders.get_order(id).await.map_err(describe)?;
            let result = orders.cancel(&order).await;
            print_order(&settled(orders, id, result).await?);
        }
        OrdersCommand::Return(args) => {
            let request = ReturnRequest::new(args.reason, args.comment).map_err(describe)?;
            let order = orders.get_order(args.id).await.map_err(describe)?;
            let result = orders.request_return(&order, request).await;
            print_order(&settled(orders, args.id, result).await?);
        }
        OrdersCommand::Invoice(args) => {
            let order = orders.get_order(args.id).await.map_err(describe)?;
            let document = orders.invoice(&order).await.map_err(describe)?;
            write_document(&args.out, &document)?;
        }
        OrdersCommand::Label(args) => {
            let order = orders.get_order(args.id).await.map_err(describe)?;
            let document = orders.return_label(&order).await.map_err(describe)?;
            write_document(&args.out, &document)?;
        }
    }
    Ok(())
}

async fn run_pay(
    storefront: &Storefront<HttpCommerceBackend>,
    command: PayCommand,
) -> Result<(), String> {
    let orders = &storefront.orders;
    match command {
        PayCommand::Start { id } => {
            let order = orders.get_order(id).await.map_err(describe)?;
            let result = orders.start_payment(&order).await;
            let redirect = settled(orders, id, result).await?;
            println!("checkout_url: {}", redirect.checkout_url);
            println!("reference: {}", redirect.order_reference);
        }
        PayCommand::Confirm { session_id } => {
            print_order(&orders.confirm_payment(&session_id).await.map_err(describe)?);
        }
    }
    Ok(())
}

/// Shows the backend's current view of an order whose transition was
/// refused, then reports the refusal.
async fn settled<T>(
    orders: &OrderService<HttpCommerceBackend>,
    id: OrderId,
    result: Result<T, DomainError>,
) -> Result<T, String> {
    match result {
        Err(e) if e.requires_refetch() => {
            if let Ok(current) = orders.get_order(id).await {
                print_order(&current);
            }
            Err(describe(e))
        }
        other => other.map_err(describe),
    }
}

fn describe(e: DomainError) -> String {
    match e {
        DomainError::NotAuthenticated => {
            "not signed in; set STOREFRONT_API_TOKEN and retry".to_string()
        }
        e if e.is_retryable() => format!("{e}; try again"),
        other => other.to_string(),
    }
}

fn print_cart(cart: &Cart) {
    println!("cart {}", cart.cart_id);
    for item in &cart.items {
        println!(
            "  {}\t{}\t{} x {}\t{}",
            item.product_id, item.name, item.quantity, item.unit_price, item.line_total
        );
    }
    println!("items: {}", cart.total_quantity);
    println!("total: {}", cart.total_amount);
}

fn print_order(order: &Order) {
    let actions = order.actions();
    println!("order {} ({})", order.id, order.reference);
    if order.status.is_terminal() {
        println!("status: {} (closed)", order.status);
    } else {
        println!("status: {}", order.status);
    }
    println!("placed: {}", order.created_at.to_rfc3339());
    for item in &order.items {
        println!("  {}\t{} x {}", item.product_name, item.quantity, item.unit_price);
    }
    println!("total: {}", order.total_amount);

    let offered: Vec<&str> = [
        (actions.can_pay, "pay"),
        (actions.can_cancel, "cancel"),
        (actions.can_download_invoice, "invoice"),
        (actions.can_request_return, "return"),
        (actions.has_return_label, "label"),
    ]
    .into_iter()
    .filter_map(|(allowed, name)| allowed.then_some(name))
    .collect();
    if !offered.is_empty() {
        println!("actions: {}", offered.join(", "));
    }
}

fn write_document(path: &Path, document: &Document) -> Result<(), String> {
    std::fs::write(path, &document.bytes)
        .map_err(|e| format!("failed to write {}: {e}", path.display()))?;
    println!(
        "wrote {} bytes ({}) to {}",
        document.bytes.len(),
        document.content_type.as_deref().unwrap_or("unknown type"),
        path.display()
    );
    Ok(())
}
