fn main() {
    blackjack_rl::cli::run();
}
