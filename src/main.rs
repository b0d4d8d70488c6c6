use anyhow::{Context, Result};
use rigid::{AlgebraConfig, Resolver, args};

fn main() -> Result<()> {
    init_tracing();

    let config = match std::env::args().nth(1) {
        Some(path) => AlgebraConfig::load(&path).with_context(|| format!("loading {path}"))?,
        None => AlgebraConfig::default(),
    };
    tracing::info!(?config, "starting");
    let resolver = Resolver::new(config);

    let a = resolver.se2(args![1.0, 2.0, 90.0, "deg"])?;
    let b = resolver.se2(args![[3.0, 4.0]])?;
    println!("a       = {a}");
    println!("b       = {b}");
    println!("a * b   = {}", a.compose(&b)?);
    println!("a / b   = {}", a.divide(&b)?);
    println!("a^-1    = {}", a.inverse());
    println!("a^3     = {}", a.try_pow(3.0)?);

    if let Some(poses) = a.numeric() {
        for (pose, xi) in poses.iter().zip(&poses.log()) {
            println!("log({pose}) = {:?}", xi.to_vector());
        }
    }

    let q = resolver.quaternion(args![[0.5, 0.5, 0.5, 0.5]])?;
    let p = resolver.quaternion(args![0.0, [1.0, 0.0, 0.0]])?;
    println!("q       = {q}");
    println!("q * p   = {}", q.times(&p)?);
    println!("q^-1    = {}", q.inverse());

    Ok(())
}

fn init_tracing() {
    let subscriber = tracing_subscriber::FmtSubscriber::builder()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .finish();

    if tracing::subscriber::set_global_default(subscriber).is_err() {
        eprintln!("tracing subscriber already set");
    }
}
