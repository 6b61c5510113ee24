fn main() {
    gravity_box::run();
}
